use byteorder::{LittleEndian, ReadBytesExt};
use model::{Corners, PacketFormat, Reading, Vec3};
use std::io::{self, Cursor};

type WireOrder = LittleEndian;

// Horizon inserts 12 unknown bytes between the sled and dash blocks.
const SLED_LEN: u64 = 232;
const FH4_DASH_OFFSET: u64 = 244;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed {format} packet: expected at least {expected} bytes, got {actual}")]
    Malformed { format: PacketFormat, expected: usize, actual: usize },
    #[error("packet ended early")]
    Truncated,
}

/// Decodes one datagram. Bytes past the layout's length are ignored.
pub fn decode(buf: &[u8], format: PacketFormat) -> Result<Reading, DecodeError> {
    let expected = format.packet_len();
    if buf.len() < expected {
        return Err(DecodeError::Malformed { format, expected, actual: buf.len() });
    }
    read_packet(Cursor::new(&buf[..expected]), format).map_err(|_| DecodeError::Truncated)
}

fn read_packet(mut c: Cursor<&[u8]>, format: PacketFormat) -> io::Result<Reading> {
    let mut r = Reading::default();
    read_sled(&mut c, &mut r)?;
    match format {
        PacketFormat::Sled => {}
        PacketFormat::Fm7Dash => read_dash(&mut c, &mut r)?,
        PacketFormat::Dash => {
            read_dash(&mut c, &mut r)?;
            r.tire_wear = corners_f32(&mut c)?;
            r.track_ordinal = c.read_i32::<WireOrder>()?;
        }
        PacketFormat::Fh4 => {
            c.set_position(FH4_DASH_OFFSET);
            read_dash(&mut c, &mut r)?;
        }
    }
    Ok(r)
}

fn read_sled(c: &mut Cursor<&[u8]>, r: &mut Reading) -> io::Result<()> {
    r.is_race_on = c.read_i32::<WireOrder>()? != 0;
    r.timestamp_ms = c.read_u32::<WireOrder>()?;
    r.engine_max_rpm = c.read_f32::<WireOrder>()?;
    r.engine_idle_rpm = c.read_f32::<WireOrder>()?;
    r.current_engine_rpm = c.read_f32::<WireOrder>()?;
    r.acceleration = vec3(c)?;
    r.velocity = vec3(c)?;
    r.angular_velocity = vec3(c)?;
    r.yaw = c.read_f32::<WireOrder>()?;
    r.pitch = c.read_f32::<WireOrder>()?;
    r.roll = c.read_f32::<WireOrder>()?;
    r.norm_suspension_travel = corners_f32(c)?;
    r.tire_slip_ratio = corners_f32(c)?;
    r.wheel_rotation_speed = corners_f32(c)?;
    r.wheel_on_rumble_strip = Corners {
        fl: c.read_i32::<WireOrder>()?,
        fr: c.read_i32::<WireOrder>()?,
        rl: c.read_i32::<WireOrder>()?,
        rr: c.read_i32::<WireOrder>()?,
    };
    r.wheel_in_puddle = corners_f32(c)?;
    r.surface_rumble = corners_f32(c)?;
    r.tire_slip_angle = corners_f32(c)?;
    r.tire_combined_slip = corners_f32(c)?;
    r.suspension_travel_meters = corners_f32(c)?;
    r.car_ordinal = c.read_i32::<WireOrder>()?;
    r.car_class = c.read_i32::<WireOrder>()?;
    r.car_performance_index = c.read_i32::<WireOrder>()?;
    r.drivetrain_type = c.read_i32::<WireOrder>()?;
    r.num_cylinders = c.read_i32::<WireOrder>()?;
    debug_assert_eq!(c.position(), SLED_LEN);
    Ok(())
}

fn read_dash(c: &mut Cursor<&[u8]>, r: &mut Reading) -> io::Result<()> {
    r.position = vec3(c)?;
    r.speed = c.read_f32::<WireOrder>()?;
    r.power = c.read_f32::<WireOrder>()?;
    r.torque = c.read_f32::<WireOrder>()?;
    r.tire_temp = corners_f32(c)?;
    r.boost = c.read_f32::<WireOrder>()?;
    r.fuel = c.read_f32::<WireOrder>()?;
    r.distance_traveled = c.read_f32::<WireOrder>()?;
    r.best_lap_time = c.read_f32::<WireOrder>()?;
    r.last_lap_time = c.read_f32::<WireOrder>()?;
    r.current_lap_time = c.read_f32::<WireOrder>()?;
    r.current_race_time = c.read_f32::<WireOrder>()?;
    r.lap_number = c.read_u16::<WireOrder>()?;
    r.race_position = c.read_u8()?;
    r.accel = c.read_u8()?;
    r.brake = c.read_u8()?;
    r.clutch = c.read_u8()?;
    r.handbrake = c.read_u8()?;
    r.gear = c.read_u8()?;
    r.steer = c.read_i8()?;
    r.norm_driving_line = c.read_i8()?;
    r.norm_ai_brake_diff = c.read_i8()?;
    Ok(())
}

fn vec3(c: &mut Cursor<&[u8]>) -> io::Result<Vec3> {
    Ok(Vec3 {
        x: c.read_f32::<WireOrder>()?,
        y: c.read_f32::<WireOrder>()?,
        z: c.read_f32::<WireOrder>()?,
    })
}

fn corners_f32(c: &mut Cursor<&[u8]>) -> io::Result<Corners<f32>> {
    Ok(Corners {
        fl: c.read_f32::<WireOrder>()?,
        fr: c.read_f32::<WireOrder>()?,
        rl: c.read_f32::<WireOrder>()?,
        rr: c.read_f32::<WireOrder>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ParamId, ParamValue};
    use proptest::prelude::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn put_f32(buf: &mut [u8], off: usize, v: f32) {
        buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn put_i32(buf: &mut [u8], off: usize, v: i32) {
        buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn put_u16(buf: &mut [u8], off: usize, v: u16) {
        buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn sled_block(buf: &mut [u8]) {
        put_i32(buf, 0, 1);
        buf[4..8].copy_from_slice(&123_456u32.to_le_bytes());
        put_f32(buf, 8, 8500.0);
        put_f32(buf, 12, 900.0);
        put_f32(buf, 16, 6100.5);
        put_f32(buf, 20, 0.25); // acceleration x
        put_f32(buf, 40, -3.5); // velocity z
        put_f32(buf, 56, 1.5); // yaw
        put_f32(buf, 64, -0.125); // roll
        put_f32(buf, 68, 0.4); // suspension FL
        put_i32(buf, 128, 1); // rumble strip RR
        put_f32(buf, 192, 2.75); // combined slip RR
        put_i32(buf, 212, 2352);
        put_i32(buf, 216, 5);
        put_i32(buf, 220, 998);
        put_i32(buf, 224, 2);
        put_i32(buf, 228, 8);
    }

    fn dash_block(buf: &mut [u8], base: usize) {
        put_f32(buf, base, 101.0); // position x
        put_f32(buf, base + 8, -55.5); // position z
        put_f32(buf, base + 12, 62.5); // speed
        put_f32(buf, base + 24, 180.0); // tire temp FL
        put_f32(buf, base + 36, 205.0); // tire temp RR
        put_f32(buf, base + 44, 0.63); // fuel
        put_f32(buf, base + 48, 15_234.5); // distance
        put_f32(buf, base + 52, 92.125); // best
        put_f32(buf, base + 56, 93.5); // last
        put_f32(buf, base + 60, 12.75); // current
        put_f32(buf, base + 64, 300.0); // race time
        put_u16(buf, base + 68, 4);
        buf[base + 70] = 3; // race position
        buf[base + 71] = 255; // accel
        buf[base + 72] = 12; // brake
        buf[base + 75] = 5; // gear
        buf[base + 76] = (-40i8) as u8;
        buf[base + 78] = (-7i8) as u8;
    }

    fn check_sled(r: &Reading) {
        assert!(r.is_race_on);
        assert_eq!(r.timestamp_ms, 123_456);
        assert_eq!(r.engine_max_rpm, 8500.0);
        assert_eq!(r.engine_idle_rpm, 900.0);
        assert_eq!(r.current_engine_rpm, 6100.5);
        assert_eq!(r.acceleration.x, 0.25);
        assert_eq!(r.velocity.z, -3.5);
        assert_eq!(r.yaw, 1.5);
        assert_eq!(r.roll, -0.125);
        assert_eq!(r.norm_suspension_travel.fl, 0.4);
        assert_eq!(r.wheel_on_rumble_strip.rr, 1);
        assert_eq!(r.tire_combined_slip.rr, 2.75);
        assert_eq!(r.car_ordinal, 2352);
        assert_eq!(r.car_class, 5);
        assert_eq!(r.car_performance_index, 998);
        assert_eq!(r.drivetrain_type, 2);
        assert_eq!(r.num_cylinders, 8);
    }

    fn check_dash(r: &Reading) {
        assert_eq!(r.position.x, 101.0);
        assert_eq!(r.position.z, -55.5);
        assert_eq!(r.speed, 62.5);
        assert_eq!(r.tire_temp.fl, 180.0);
        assert_eq!(r.tire_temp.rr, 205.0);
        assert_eq!(r.fuel, 0.63);
        assert_eq!(r.distance_traveled, 15_234.5);
        assert_eq!(r.best_lap_time, 92.125);
        assert_eq!(r.last_lap_time, 93.5);
        assert_eq!(r.current_lap_time, 12.75);
        assert_eq!(r.current_race_time, 300.0);
        assert_eq!(r.lap_number, 4);
        assert_eq!(r.race_position, 3);
        assert_eq!(r.accel, 255);
        assert_eq!(r.brake, 12);
        assert_eq!(r.gear, 5);
        assert_eq!(r.steer, -40);
        assert_eq!(r.norm_ai_brake_diff, -7);
    }

    #[test]
    fn decodes_motorsport_dash_packet() -> TestResult {
        let mut buf = vec![0u8; 331];
        sled_block(&mut buf);
        dash_block(&mut buf, 232);
        put_f32(&mut buf, 311, 0.1);
        put_f32(&mut buf, 323, 0.4);
        put_i32(&mut buf, 327, 110);

        let r = decode(&buf, PacketFormat::Dash)?;
        check_sled(&r);
        check_dash(&r);
        assert_eq!(r.tire_wear, Corners { fl: 0.1, fr: 0.0, rl: 0.0, rr: 0.4 });
        assert_eq!(r.track_ordinal, 110);
        Ok(())
    }

    #[test]
    fn decodes_fm7_dash_without_trailer() -> TestResult {
        let mut buf = vec![0u8; 311];
        sled_block(&mut buf);
        dash_block(&mut buf, 232);
        let r = decode(&buf, PacketFormat::Fm7Dash)?;
        check_sled(&r);
        check_dash(&r);
        assert_eq!(r.track_ordinal, 0);
        Ok(())
    }

    #[test]
    fn decodes_horizon_packet_with_shifted_dash() -> TestResult {
        let mut buf = vec![0u8; 324];
        sled_block(&mut buf);
        buf[232..244].fill(0xAB);
        dash_block(&mut buf, 244);
        let r = decode(&buf, PacketFormat::Fh4)?;
        check_sled(&r);
        check_dash(&r);
        Ok(())
    }

    #[test]
    fn sled_packet_leaves_dash_fields_zeroed() -> TestResult {
        let mut buf = vec![0u8; 232];
        sled_block(&mut buf);
        let r = decode(&buf, PacketFormat::Sled)?;
        check_sled(&r);
        assert_eq!(r.speed, 0.0);
        assert_eq!(r.lap_number, 0);
        Ok(())
    }

    fn wire_width(id: ParamId) -> usize {
        match id {
            ParamId::LapNo => 2,
            ParamId::RacePos
            | ParamId::Accel
            | ParamId::Brake
            | ParamId::Clutch
            | ParamId::Handbrake
            | ParamId::Gear
            | ParamId::Steer
            | ParamId::NormDrivingLine
            | ParamId::NormAiBrakeDiff => 1,
            _ => 4,
        }
    }

    // Walks the field table in wire order, writing a different value into
    // each field. Returns the packet and what every field should decode to.
    fn every_field_packet(format: PacketFormat) -> (Vec<u8>, Vec<(ParamId, ParamValue)>) {
        let mut buf = vec![0u8; format.packet_len()];
        let mut expected = Vec::new();
        let mut off = 0;
        for (i, &id) in ParamId::for_format(format).iter().enumerate() {
            if id == ParamId::PositionX {
                assert_eq!(off as u64, SLED_LEN);
                if format == PacketFormat::Fh4 {
                    off = FH4_DASH_OFFSET as usize;
                }
            }
            let width = wire_width(id);
            let value = match (id.value(&Reading::default()), width) {
                (ParamValue::Bool(_), _) => {
                    put_i32(&mut buf, off, 1);
                    ParamValue::Bool(true)
                }
                (ParamValue::Float(_), _) => {
                    let v = i as f32 + 0.25;
                    put_f32(&mut buf, off, v);
                    ParamValue::Float(v)
                }
                (ParamValue::Int(_), 4) => {
                    let v = 1000 + 7 * i as i32;
                    put_i32(&mut buf, off, v);
                    ParamValue::Int(i64::from(v))
                }
                (ParamValue::Int(_), 2) => {
                    let v = 300 + i as u16;
                    put_u16(&mut buf, off, v);
                    ParamValue::Int(i64::from(v))
                }
                (ParamValue::Int(_), _) => {
                    // below 128 so signed and unsigned bytes agree
                    let v = i as u8;
                    buf[off] = v;
                    ParamValue::Int(i64::from(v))
                }
            };
            expected.push((id, value));
            off += width;
        }
        // Horizon packets end with one byte the decoder does not read
        let unread = if format == PacketFormat::Fh4 { 1 } else { 0 };
        assert_eq!(off + unread, buf.len(), "{format} layout");
        (buf, expected)
    }

    #[test]
    fn every_field_decodes_from_its_offset() -> TestResult {
        for format in PacketFormat::ALL {
            let (buf, expected) = every_field_packet(format);
            let r = decode(&buf, format)?;
            for (id, value) in expected {
                assert_eq!(id.value(&r), value, "{format} {id}");
            }
        }
        Ok(())
    }

    #[test]
    fn race_off_flag() -> TestResult {
        let buf = vec![0u8; 331];
        assert!(!decode(&buf, PacketFormat::Dash)?.is_race_on);
        Ok(())
    }

    #[test]
    fn short_buffer_is_malformed() {
        let buf = vec![0u8; 311];
        assert_eq!(
            decode(&buf, PacketFormat::Dash),
            Err(DecodeError::Malformed { format: PacketFormat::Dash, expected: 331, actual: 311 })
        );
        assert!(decode(&[], PacketFormat::Sled).is_err());
    }

    #[test]
    fn trailing_bytes_are_ignored_and_decoding_is_stable() -> TestResult {
        let mut buf = vec![0u8; 400];
        sled_block(&mut buf);
        dash_block(&mut buf, 232);
        let a = decode(&buf, PacketFormat::Fm7Dash)?;
        let b = decode(&buf, PacketFormat::Fm7Dash)?;
        assert_eq!(a, b);
        Ok(())
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
            for format in PacketFormat::ALL {
                let res = decode(&data, format);
                prop_assert_eq!(res.is_ok(), data.len() >= format.packet_len());
            }
        }
    }
}

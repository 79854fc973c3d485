//! NMEA sentence writer.
//!
//! Every GNSS sample becomes two `nmea_msgs/Sentence` messages on the same
//! topic: a `GPGGA` position fix, then a `QQ02C,INSATT` attitude report.
//! The attitude sentence is sent from the fix's completion, so the caller's
//! callback only runs once both are enqueued (or the first one failed).

use std::sync::Arc;

use simbridge_core::{CompletionCallback, Connection, WireMessage, serialize};
use simbridge_frames::angles::euler_degrees;
use simbridge_types::{BridgeError, GpsData};
use tracing::{error, warn};

use crate::convert::header;
use crate::msg::Sentence;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// XOR of every byte of `body` (the characters between `$` and `*`).
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// `$body*HH`.
pub fn with_checksum(body: &str) -> String {
    format!("${body}*{:02X}", checksum(body))
}

/// UTC time of day as `hhmmss.ss`.
pub fn time_of_day(time: f64) -> String {
    let centis = (time.rem_euclid(SECONDS_PER_DAY) * 100.0).round() as u64 % 8_640_000;
    let secs = centis / 100;
    format!(
        "{:02}{:02}{:02}.{:02}",
        secs / 3600,
        secs / 60 % 60,
        secs % 60,
        centis % 100
    )
}

/// Degrees and minutes with four decimals, degrees padded to `width`.
fn degrees_minutes(value: f64, width: usize) -> String {
    let units = (value.abs() * 60.0 * 10_000.0).round() as u64;
    let degrees = units / 600_000;
    let minutes = units % 600_000;
    format!(
        "{degrees:0width$}{:02}.{:04}",
        minutes / 10_000,
        minutes % 10_000
    )
}

/// `ddmm.mmmm`.
pub fn latitude(lat: f64) -> String {
    degrees_minutes(lat, 2)
}

/// `dddmm.mmmm`.
pub fn longitude(lon: f64) -> String {
    degrees_minutes(lon, 3)
}

pub fn gga_sentence(data: &GpsData) -> String {
    let body = format!(
        "GPGGA,{},{},{},{},{},1,10,1.0,{:.1},M,0.0,M,,",
        time_of_day(data.time),
        latitude(data.latitude),
        if data.latitude >= 0.0 { 'N' } else { 'S' },
        longitude(data.longitude),
        if data.longitude >= 0.0 { 'E' } else { 'W' },
        data.altitude,
    );
    with_checksum(&body)
}

pub fn insatt_sentence(data: &GpsData) -> String {
    let euler = euler_degrees(data.orientation);
    let (pitch, yaw, roll) = (euler.x, euler.y, euler.z);
    let body = format!(
        "QQ02C,INSATT,V,{},{roll:.3},{pitch:.3},{yaw:.3},",
        time_of_day(data.time)
    );
    with_checksum(&body)
}

pub struct NmeaWriter {
    conn: Arc<dyn Connection>,
    topic: String,
}

impl NmeaWriter {
    pub fn new(conn: Arc<dyn Connection>, topic: impl Into<String>) -> Self {
        Self {
            conn,
            topic: topic.into(),
        }
    }

    pub fn write(&self, data: &GpsData, on_complete: CompletionCallback) {
        let header = header(&data.frame, data.sequence, data.time);
        let fix = Sentence {
            header: header.clone(),
            sentence: gga_sentence(data),
        };
        let attitude = Sentence {
            header,
            sentence: insatt_sentence(data),
        };

        let (fix, attitude) = match serialize(&fix).and_then(|f| Ok((f, serialize(&attitude)?))) {
            Ok(pair) => pair,
            Err(e) => {
                error!(
                    topic = %self.topic,
                    type_name = Sentence::TYPE_NAME,
                    error = %e,
                    "failed to serialize NMEA sentences"
                );
                on_complete(Err(e));
                return;
            }
        };

        let conn = Arc::clone(&self.conn);
        let topic = self.topic.clone();
        self.conn.send(
            &self.topic,
            fix,
            Box::new(move |result: Result<(), BridgeError>| match result {
                Ok(()) => conn.send(&topic, attitude, on_complete),
                Err(e) => {
                    warn!(topic = %topic, error = %e, "GPGGA send failed, INSATT skipped");
                    on_complete(Err(e));
                }
            }),
        );
    }
}

pub(crate) fn advertise(conn: &dyn Connection, topic: &str) -> Result<(), BridgeError> {
    conn.add_publisher(topic, Sentence::TYPE_NAME)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use simbridge_core::LoopbackConnection;
    use simbridge_types::{Quaternion, Vec3};
    use std::sync::Mutex;

    fn make_gps() -> GpsData {
        GpsData {
            frame: "gps".into(),
            time: 1_600_000_000.25,
            sequence: 6,
            latitude: 48.1173,
            longitude: -11.516_666_7,
            altitude: 545.44,
            ..Default::default()
        }
    }

    fn body_of(sentence: &str) -> &str {
        let start = sentence.find('$').unwrap() + 1;
        let end = sentence.rfind('*').unwrap();
        &sentence[start..end]
    }

    #[test]
    fn checksum_matches_reference_sentence() {
        let reference = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
        assert_eq!(checksum(body_of(reference)), 0x47);
        assert_eq!(with_checksum(body_of(reference)), reference);
    }

    #[test]
    fn coordinates_and_time_formatting() {
        assert_eq!(latitude(48.1173), "4807.0380");
        assert_eq!(longitude(11.516_666_7), "01131.0000");
        assert_eq!(latitude(-5.5), "0530.0000");
        assert_eq!(time_of_day(1_600_000_000.25), "122640.25");
        assert_eq!(time_of_day(86_399.999), "000000.00");
    }

    #[test]
    fn gga_fields() {
        let gga = gga_sentence(&make_gps());
        assert!(gga.starts_with("$GPGGA,122640.25,4807.0380,N,01131.0000,W,1,10,1.0,545.4,M,0.0,M,,*"));
        let checksum_hex = &gga[gga.len() - 2..];
        assert_eq!(checksum_hex, format!("{:02X}", checksum(body_of(&gga))));
    }

    #[test]
    fn insatt_reports_roll_pitch_yaw() {
        let mut gps = make_gps();
        gps.orientation = Quaternion::angle_axis(90.0, Vec3::new(0.0, 1.0, 0.0));
        let att = insatt_sentence(&gps);
        assert!(att.starts_with("$QQ02C,INSATT,V,122640.25,0.000,0.000,90.000,*"), "{att}");
    }

    #[test]
    fn both_sentences_sent_before_completion() {
        let conn = LoopbackConnection::new();
        advertise(&conn, "/nmea").unwrap();
        let writer = NmeaWriter::new(Arc::new(conn.clone()), "/nmea");

        let observed = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&observed);
        let probe = conn.clone();
        writer.write(
            &make_gps(),
            Box::new(move |r| *slot.lock().unwrap() = Some((r, probe.sent_on("/nmea").len()))),
        );

        assert_eq!(*observed.lock().unwrap(), Some((Ok(()), 2)));
        let frames: Vec<Sentence> = conn
            .sent_on("/nmea")
            .iter()
            .map(|f| f.decode().unwrap())
            .collect();
        assert!(frames[0].sentence.starts_with("$GPGGA"));
        assert!(frames[1].sentence.starts_with("$QQ02C,INSATT"));
        assert_eq!(frames[0].header, frames[1].header);
        assert_eq!(frames[0].header.seq, 6);
    }

    #[test]
    fn failed_fix_skips_attitude() {
        let conn = LoopbackConnection::new();
        advertise(&conn, "/nmea").unwrap();
        conn.set_fail_sends(true);
        let writer = NmeaWriter::new(Arc::new(conn.clone()), "/nmea");

        let observed = Arc::new(Mutex::new(Vec::new()));
        let slot = Arc::clone(&observed);
        writer.write(&make_gps(), Box::new(move |r| slot.lock().unwrap().push(r)));

        let results = observed.lock().unwrap();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(BridgeError::Transport(_))));
        assert!(conn.sent().is_empty());
    }
}

//! Binary point-cloud writer.
//!
//! LiDAR sweeps are large, so they skip the per-field converter path: the
//! writer packs points straight into a byte buffer it owns and serializes a
//! borrowed view of it.
//!
//! Layout per point (`point_step` = 32, little-endian):
//!
//! | offset | field       | type    |
//! |--------|-------------|---------|
//! | 0      | `x`         | FLOAT32 |
//! | 4      | `y`         | FLOAT32 |
//! | 8      | `z`         | FLOAT32 |
//! | 16     | `intensity` | UINT8   |
//! | 24     | `timestamp` | FLOAT64 |

use std::sync::Arc;

use serde::Serialize;
use simbridge_core::wire::base64_bytes;
use simbridge_core::{CompletionCallback, Connection, WireMessage, serialize};
use simbridge_types::{BridgeError, PointCloudData};
use tracing::error;

use crate::convert::header;
use crate::msg::{Header, PointCloud2, PointField};

pub const POINT_STEP: usize = 32;

const OFFSET_X: usize = 0;
const OFFSET_Y: usize = 4;
const OFFSET_Z: usize = 8;
const OFFSET_INTENSITY: usize = 16;
const OFFSET_TIMESTAMP: usize = 24;

/// Serialize-only view of `sensor_msgs/PointCloud2` borrowing the packed
/// buffer.
#[derive(Serialize)]
struct PointCloud2Ref<'a> {
    header: Header,
    height: u32,
    width: u32,
    fields: &'a [PointField],
    is_bigendian: bool,
    point_step: u32,
    row_step: u32,
    #[serde(with = "base64_bytes")]
    data: &'a [u8],
    is_dense: bool,
}

fn point_fields() -> Vec<PointField> {
    vec![
        PointField::new("x", OFFSET_X as u32, PointField::FLOAT32),
        PointField::new("y", OFFSET_Y as u32, PointField::FLOAT32),
        PointField::new("z", OFFSET_Z as u32, PointField::FLOAT32),
        PointField::new("intensity", OFFSET_INTENSITY as u32, PointField::UINT8),
        PointField::new("timestamp", OFFSET_TIMESTAMP as u32, PointField::FLOAT64),
    ]
}

/// One writer per publisher instance.  Not shared: `write` takes `&mut self`.
pub struct PointCloudWriter {
    conn: Arc<dyn Connection>,
    topic: String,
    fields: Vec<PointField>,
    buffer: Vec<u8>,
}

impl PointCloudWriter {
    pub fn new(conn: Arc<dyn Connection>, topic: impl Into<String>) -> Self {
        Self {
            conn,
            topic: topic.into(),
            fields: point_fields(),
            buffer: Vec::new(),
        }
    }

    /// Bytes currently held by the scratch buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn write(&mut self, data: &PointCloudData, on_complete: CompletionCallback) {
        let width = self.pack(data);
        let cloud = PointCloud2Ref {
            header: header(&data.frame, data.sequence, data.time),
            height: 1,
            width: width as u32,
            fields: &self.fields,
            is_bigendian: false,
            point_step: POINT_STEP as u32,
            row_step: (POINT_STEP * width) as u32,
            data: &self.buffer,
            is_dense: true,
        };

        match serialize(&cloud) {
            Ok(payload) => self.conn.send(&self.topic, payload, on_complete),
            Err(e) => {
                error!(
                    topic = %self.topic,
                    type_name = PointCloud2::TYPE_NAME,
                    error = %e,
                    "failed to serialize point cloud"
                );
                on_complete(Err(e));
            }
        }
    }

    /// Pack every non-empty point and return how many were written.
    fn pack(&mut self, data: &PointCloudData) -> usize {
        let count = data.points.iter().filter(|p| !p.is_zero()).count();
        let size = count * POINT_STEP;
        if self.buffer.len() != size {
            self.buffer.resize(size, 0);
        }

        let points = data.points.iter().filter(|p| !p.is_zero());
        for (chunk, p) in self.buffer.chunks_exact_mut(POINT_STEP).zip(points) {
            let pos = data.lidar_transform.multiply_point3x4(p.xyz());
            let intensity = (p.w * 255.0).clamp(0.0, 255.0) as u8;

            chunk.fill(0);
            chunk[OFFSET_X..OFFSET_X + 4].copy_from_slice(&pos.x.to_le_bytes());
            chunk[OFFSET_Y..OFFSET_Y + 4].copy_from_slice(&pos.y.to_le_bytes());
            chunk[OFFSET_Z..OFFSET_Z + 4].copy_from_slice(&pos.z.to_le_bytes());
            chunk[OFFSET_INTENSITY] = intensity;
            chunk[OFFSET_TIMESTAMP..OFFSET_TIMESTAMP + 8].copy_from_slice(&data.time.to_le_bytes());
        }
        count
    }
}

/// Advertise `topic` as a point-cloud topic.
pub(crate) fn advertise(conn: &dyn Connection, topic: &str) -> Result<(), BridgeError> {
    conn.add_publisher(topic, PointCloud2::TYPE_NAME)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use simbridge_core::LoopbackConnection;
    use simbridge_types::{Matrix4, Vec3, Vec4};
    use std::sync::Mutex;

    fn make_writer() -> (LoopbackConnection, PointCloudWriter) {
        let conn = LoopbackConnection::new();
        advertise(&conn, "/points").unwrap();
        let writer = PointCloudWriter::new(Arc::new(conn.clone()), "/points");
        (conn, writer)
    }

    fn make_cloud(points: Vec<Vec4>) -> PointCloudData {
        PointCloudData {
            frame: "velodyne".into(),
            time: 42.5,
            sequence: 1,
            lidar_transform: Matrix4::identity(),
            points,
        }
    }

    fn f32_at(data: &[u8], at: usize) -> f32 {
        f32::from_le_bytes(data[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn layout_and_zero_point_skipping() {
        let (conn, mut writer) = make_writer();
        let result = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);
        writer.write(
            &make_cloud(vec![
                Vec4::new(1.0, 2.0, 3.0, 0.5),
                Vec4::new(0.0, 0.0, 0.0, 0.0),
                Vec4::new(-1.0, 0.0, 0.0, 2.0),
            ]),
            Box::new(move |r| *slot.lock().unwrap() = Some(r)),
        );
        assert_eq!(*result.lock().unwrap(), Some(Ok(())));

        let frames = conn.sent_on("/points");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].type_name, "sensor_msgs/PointCloud2");
        let cloud: PointCloud2 = frames[0].decode().unwrap();

        assert_eq!(cloud.height, 1);
        assert_eq!(cloud.width, 2);
        assert_eq!(cloud.point_step, 32);
        assert_eq!(cloud.row_step, 64);
        assert!(!cloud.is_bigendian);
        assert!(cloud.is_dense);
        assert_eq!(cloud.data.len(), 64);
        let offsets: Vec<_> = cloud.fields.iter().map(|f| (f.name.as_str(), f.offset, f.datatype)).collect();
        assert_eq!(
            offsets,
            vec![("x", 0, 7), ("y", 4, 7), ("z", 8, 7), ("intensity", 16, 2), ("timestamp", 24, 8)]
        );

        let first = &cloud.data[..32];
        assert_eq!(f32_at(first, 0), 1.0);
        assert_eq!(f32_at(first, 4), 2.0);
        assert_eq!(f32_at(first, 8), 3.0);
        assert_eq!(first[16], 127);
        assert_eq!(f64::from_le_bytes(first[24..32].try_into().unwrap()), 42.5);
        assert!(first[12..16].iter().chain(&first[17..24]).all(|b| *b == 0));

        let second = &cloud.data[32..];
        assert_eq!(f32_at(second, 0), -1.0);
        assert_eq!(second[16], 255);
    }

    #[test]
    fn positions_are_transformed() {
        let (conn, mut writer) = make_writer();
        let mut cloud = make_cloud(vec![Vec4::new(1.0, 1.0, 1.0, 0.0)]);
        cloud.lidar_transform = Matrix4::from_translation(Vec3::new(10.0, 0.0, -1.0));
        writer.write(&cloud, Box::new(|_| {}));

        let decoded: PointCloud2 = conn.sent_on("/points")[0].decode().unwrap();
        assert_eq!(f32_at(&decoded.data, 0), 11.0);
        assert_eq!(f32_at(&decoded.data, 8), 0.0);
        assert_eq!(decoded.data[16], 0);
    }

    #[test]
    fn buffer_tracks_point_count() {
        let (_conn, mut writer) = make_writer();
        writer.write(&make_cloud(vec![Vec4::new(1.0, 0.0, 0.0, 1.0); 4]), Box::new(|_| {}));
        assert_eq!(writer.buffer_len(), 128);
        writer.write(&make_cloud(vec![Vec4::new(2.0, 0.0, 0.0, 1.0); 4]), Box::new(|_| {}));
        assert_eq!(writer.buffer_len(), 128);
        writer.write(&make_cloud(vec![Vec4::new(1.0, 0.0, 0.0, 1.0)]), Box::new(|_| {}));
        assert_eq!(writer.buffer_len(), 32);
    }

    #[test]
    fn transport_failure_reaches_callback() {
        let (conn, mut writer) = make_writer();
        conn.set_fail_sends(true);
        let result = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);
        writer.write(
            &make_cloud(vec![Vec4::new(1.0, 0.0, 0.0, 1.0)]),
            Box::new(move |r| *slot.lock().unwrap() = Some(r)),
        );
        assert!(matches!(
            *result.lock().unwrap(),
            Some(Err(BridgeError::Transport(_)))
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::Candidate;

/// Candidates below this confidence are discarded. DenseList and FlatPacked
/// accept a value exactly at the threshold; ChannelMajorAnchor requires
/// strictly above it.
pub const CONF_THRESHOLD: f32 = 0.15;

/// IoU threshold for the suppression pass the ChannelMajorAnchor format needs.
pub const NMS_IOU_THRESHOLD: f32 = 0.4;

/// Output layout tag, set once at model-load time and carried with the
/// tensor. Never inferred from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelFamily {
    /// N x 7 rows: [batch, x0, y0, x1, y1, class, conf]. Model suppresses
    /// overlaps itself.
    DenseList,
    /// Flat 6-tuples [x0, y0, x1, y1, conf, class], sorted by confidence
    /// descending (format invariant, not re-verified here).
    FlatPacked,
    /// [1, 4+classes, anchors] channel-major: box channels 0..3, then one
    /// score channel per class. Needs NMS afterwards.
    ChannelMajorAnchor,
}

impl ModelFamily {
    pub fn needs_nms(self) -> bool {
        matches!(self, ModelFamily::ChannelMajorAnchor)
    }
}

/// Raw inference output plus the shape/resolution metadata the external
/// engine hands over with it. Consumed once per frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorFrame {
    pub family: ModelFamily,
    pub dims: Vec<usize>,
    pub data: Vec<f32>,
    pub model_w: f32,
    pub model_h: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{family:?}: expected rank-{expected} dims, got {got:?}")]
    BadRank {
        family: ModelFamily,
        expected: usize,
        got: Vec<usize>,
    },
    #[error("{family:?}: expected stride {expected}, dims give {got}")]
    BadStride {
        family: ModelFamily,
        expected: usize,
        got: usize,
    },
    #[error("{family:?}: needs 4 box channels plus at least one class channel, got {got}")]
    BadChannels { family: ModelFamily, got: usize },
    #[error("tensor buffer too short: dims imply {need} values, buffer holds {got}")]
    Truncated { need: usize, got: usize },
    #[error("model resolution must be positive, got {w}x{h}")]
    BadResolution { w: f32, h: f32 },
}

pub fn decode(frame: &TensorFrame) -> Result<Vec<Candidate>, DecodeError> {
    match frame.family {
        ModelFamily::DenseList => decode_dense_list(&frame.dims, &frame.data),
        ModelFamily::FlatPacked => decode_flat_packed(&frame.dims, &frame.data),
        ModelFamily::ChannelMajorAnchor => decode_channel_major(&frame.dims, &frame.data),
    }
}

fn decode_dense_list(dims: &[usize], data: &[f32]) -> Result<Vec<Candidate>, DecodeError> {
    let family = ModelFamily::DenseList;
    let &[rows, stride] = dims else {
        return Err(DecodeError::BadRank {
            family,
            expected: 2,
            got: dims.to_vec(),
        });
    };
    if stride != 7 {
        return Err(DecodeError::BadStride {
            family,
            expected: 7,
            got: stride,
        });
    }
    let need = rows * 7;
    if data.len() < need {
        return Err(DecodeError::Truncated {
            need,
            got: data.len(),
        });
    }

    let mut out = Vec::new();
    for i in 0..rows {
        let row = &data[i * 7..i * 7 + 7];
        // row[0] is the batch id, unused here
        let conf = row[6];
        if conf < CONF_THRESHOLD {
            continue;
        }
        out.push(Candidate {
            class_id: row[5].round() as i64,
            conf,
            x0: row[1],
            y0: row[2],
            x1: row[3],
            y1: row[4],
        });
    }
    Ok(out)
}

fn decode_flat_packed(dims: &[usize], data: &[f32]) -> Result<Vec<Candidate>, DecodeError> {
    let family = ModelFamily::FlatPacked;
    let &[_batch, entries, stride] = dims else {
        return Err(DecodeError::BadRank {
            family,
            expected: 3,
            got: dims.to_vec(),
        });
    };
    if stride != 6 {
        return Err(DecodeError::BadStride {
            family,
            expected: 6,
            got: stride,
        });
    }
    let need = entries * 6;
    if data.len() < need {
        return Err(DecodeError::Truncated {
            need,
            got: data.len(),
        });
    }

    let mut out = Vec::new();
    for i in 0..entries {
        let row = &data[i * 6..i * 6 + 6];
        let conf = row[4];
        // Entries are sorted by confidence; the first miss ends the frame.
        if conf < CONF_THRESHOLD {
            break;
        }
        out.push(Candidate {
            class_id: row[5].round() as i64,
            conf,
            x0: row[0],
            y0: row[1],
            x1: row[2],
            y1: row[3],
        });
    }
    Ok(out)
}

fn decode_channel_major(dims: &[usize], data: &[f32]) -> Result<Vec<Candidate>, DecodeError> {
    let family = ModelFamily::ChannelMajorAnchor;
    let &[_batch, channels, anchors] = dims else {
        return Err(DecodeError::BadRank {
            family,
            expected: 3,
            got: dims.to_vec(),
        });
    };
    if channels < 5 {
        return Err(DecodeError::BadChannels {
            family,
            got: channels,
        });
    }
    let need = channels * anchors;
    if data.len() < need {
        return Err(DecodeError::Truncated {
            need,
            got: data.len(),
        });
    }
    let num_classes = channels - 4;

    let mut out = Vec::new();
    for a in 0..anchors {
        let mut best_score = 0.0f32;
        let mut best_class = 0usize;
        for c in 0..num_classes {
            let score = data[(4 + c) * anchors + a];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        if best_score <= CONF_THRESHOLD {
            continue;
        }

        let cx = data[a];
        let cy = data[anchors + a];
        let w = data[2 * anchors + a];
        let h = data[3 * anchors + a];
        out.push(Candidate {
            class_id: best_class as i64,
            conf: best_score,
            x0: cx - w / 2.0,
            y0: cy - h / 2.0,
            x1: cx + w / 2.0,
            y1: cy + h / 2.0,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_frame(rows: Vec<[f32; 7]>) -> TensorFrame {
        TensorFrame {
            family: ModelFamily::DenseList,
            dims: vec![rows.len(), 7],
            data: rows.into_iter().flatten().collect(),
            model_w: 256.0,
            model_h: 256.0,
        }
    }

    #[test]
    fn dense_list_reads_fixed_stride_rows() {
        let frame = dense_frame(vec![
            [0.0, 10.0, 10.0, 50.0, 90.0, 0.0, 0.9],
            [0.0, 5.0, 5.0, 20.0, 20.0, 2.0, 0.1],
            [0.0, 30.0, 30.0, 60.0, 60.0, 16.0, 0.7],
        ]);
        let out = decode(&frame).unwrap();
        // The 0.1 row is rejected, later rows are still read.
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].class_id, 0);
        assert_eq!(out[1].class_id, 16);
    }

    #[test]
    fn dense_list_accepts_exact_threshold() {
        let frame = dense_frame(vec![[0.0, 1.0, 1.0, 2.0, 2.0, 3.0, CONF_THRESHOLD]]);
        assert_eq!(decode(&frame).unwrap().len(), 1);
    }

    #[test]
    fn dense_list_rejects_bad_stride() {
        let frame = TensorFrame {
            family: ModelFamily::DenseList,
            dims: vec![2, 6],
            data: vec![0.0; 12],
            model_w: 256.0,
            model_h: 256.0,
        };
        assert!(matches!(
            decode(&frame),
            Err(DecodeError::BadStride { expected: 7, .. })
        ));
    }

    #[test]
    fn dense_list_rejects_short_buffer() {
        let frame = TensorFrame {
            family: ModelFamily::DenseList,
            dims: vec![3, 7],
            data: vec![0.0; 14],
            model_w: 256.0,
            model_h: 256.0,
        };
        assert!(matches!(decode(&frame), Err(DecodeError::Truncated { .. })));
    }

    fn flat_frame(rows: Vec<[f32; 6]>) -> TensorFrame {
        TensorFrame {
            family: ModelFamily::FlatPacked,
            dims: vec![1, rows.len(), 6],
            data: rows.into_iter().flatten().collect(),
            model_w: 256.0,
            model_h: 256.0,
        }
    }

    #[test]
    fn flat_packed_stops_at_first_subthreshold() {
        let frame = flat_frame(vec![
            [10.0, 10.0, 50.0, 50.0, 0.9, 0.0],
            [12.0, 12.0, 52.0, 52.0, 0.1, 0.0],
            // Never reached even though it would pass.
            [30.0, 30.0, 60.0, 60.0, 0.8, 2.0],
        ]);
        let out = decode(&frame).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class_id, 0);
    }

    #[test]
    fn flat_packed_accepts_exact_threshold() {
        let frame = flat_frame(vec![[1.0, 1.0, 2.0, 2.0, CONF_THRESHOLD, 5.0]]);
        assert_eq!(decode(&frame).unwrap().len(), 1);
    }

    #[test]
    fn flat_packed_rejects_rank_2() {
        let frame = TensorFrame {
            family: ModelFamily::FlatPacked,
            dims: vec![4, 6],
            data: vec![0.0; 24],
            model_w: 256.0,
            model_h: 256.0,
        };
        assert!(matches!(decode(&frame), Err(DecodeError::BadRank { .. })));
    }

    /// Channel-major frame with two classes and the given per-anchor values.
    fn anchor_frame(cx: f32, cy: f32, w: f32, h: f32, s0: f32, s1: f32) -> TensorFrame {
        TensorFrame {
            family: ModelFamily::ChannelMajorAnchor,
            dims: vec![1, 6, 1],
            data: vec![cx, cy, w, h, s0, s1],
            model_w: 256.0,
            model_h: 256.0,
        }
    }

    #[test]
    fn channel_major_picks_argmax_class() {
        let out = decode(&anchor_frame(100.0, 100.0, 40.0, 80.0, 0.2, 0.6)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class_id, 1);
        assert!((out[0].conf - 0.6).abs() < 1e-6);
        // Center/size converted to corners.
        assert!((out[0].x0 - 80.0).abs() < 1e-4);
        assert!((out[0].y0 - 60.0).abs() < 1e-4);
        assert!((out[0].x1 - 120.0).abs() < 1e-4);
        assert!((out[0].y1 - 140.0).abs() < 1e-4);
    }

    #[test]
    fn channel_major_rejects_exact_threshold() {
        // Strict > here, unlike the other two formats.
        let out = decode(&anchor_frame(100.0, 100.0, 40.0, 80.0, CONF_THRESHOLD, 0.0)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn channel_major_strided_layout() {
        // Three anchors: scores put the hit on the middle anchor, class 1.
        let data = vec![
            10.0, 20.0, 30.0, // cx per anchor
            10.0, 20.0, 30.0, // cy
            4.0, 8.0, 12.0, // w
            4.0, 8.0, 12.0, // h
            0.0, 0.1, 0.0, // class 0
            0.0, 0.8, 0.05, // class 1
        ];
        let frame = TensorFrame {
            family: ModelFamily::ChannelMajorAnchor,
            dims: vec![1, 6, 3],
            data,
            model_w: 256.0,
            model_h: 256.0,
        };
        let out = decode(&frame).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class_id, 1);
        assert!((out[0].x0 - 16.0).abs() < 1e-4);
        assert!((out[0].x1 - 24.0).abs() < 1e-4);
    }

    #[test]
    fn channel_major_needs_class_channel() {
        let frame = TensorFrame {
            family: ModelFamily::ChannelMajorAnchor,
            dims: vec![1, 4, 2],
            data: vec![0.0; 8],
            model_w: 256.0,
            model_h: 256.0,
        };
        assert!(matches!(
            decode(&frame),
            Err(DecodeError::BadChannels { got: 4, .. })
        ));
    }

    #[test]
    fn unknown_class_ids_are_still_emitted() {
        let frame = dense_frame(vec![[0.0, 1.0, 1.0, 9.0, 9.0, 312.0, 0.5]]);
        let out = decode(&frame).unwrap();
        assert_eq!(out[0].class_id, 312);
    }
}

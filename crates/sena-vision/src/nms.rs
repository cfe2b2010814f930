use crate::Candidate;

/// Intersection over union of two corner-form boxes. Degenerate unions
/// report 0 overlap.
pub fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let x0 = a.x0.max(b.x0);
    let y0 = a.y0.max(b.y0);
    let x1 = a.x1.min(b.x1);
    let y1 = a.y1.min(b.y1);

    let inter = (x1 - x0).max(0.0) * (y1 - y0).max(0.0);
    let area_a = (a.x1 - a.x0).max(0.0) * (a.y1 - a.y0).max(0.0);
    let area_b = (b.x1 - b.x0).max(0.0) * (b.y1 - b.y0).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Greedy same-class suppression. Sort is stable, so equal confidences keep
/// input order and the earlier box wins. Boxes of different classes never
/// suppress each other. Output order is not part of the contract.
pub fn suppress(mut dets: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    dets.sort_by(|a, b| b.conf.total_cmp(&a.conf));

    let mut keep = vec![true; dets.len()];
    for i in 0..dets.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..dets.len() {
            if !keep[j] || dets[j].class_id != dets[i].class_id {
                continue;
            }
            if iou(&dets[i], &dets[j]) > iou_threshold {
                keep[j] = false;
            }
        }
    }

    dets.into_iter()
        .zip(keep)
        .filter_map(|(d, k)| k.then_some(d))
        .collect()
}

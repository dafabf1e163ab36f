/// Index of the largest score; the first maximum wins on ties. Returns 0
/// for an empty slice, which callers rule out by checking lengths first.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in scores.iter().enumerate() {
        if *v > scores[best] {
            best = i;
        }
    }
    best
}

/// The tutorial's validation step: do prediction and reference pick the
/// same class?
pub fn matches_reference(result: &[f32], reference: &[f32]) -> bool {
    argmax(result) == argmax(reference)
}

/// The K highest-scoring (class index, score) pairs, best first. Ties
/// keep the lower index first.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);
    ranked
}

/// Console rendition of the notebook's labeled image panel.
pub fn render_top_k(image_name: &str, scores: &[f32], labels: &[String], k: usize) -> String {
    let mut panel = format!("{image_name}\n");
    for (rank, (index, score)) in top_k(scores, k).into_iter().enumerate() {
        let label = labels
            .get(index)
            .map(String::as_str)
            .unwrap_or("<unknown>");
        panel.push_str(&format!(
            "  {:>2}. {label:<40} class {index:>4}  score {score:.4}\n",
            rank + 1
        ));
    }
    panel
}

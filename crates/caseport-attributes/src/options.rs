/// Options whose label occurs in `raw` as a whole comma-separated token.
///
/// Labels are matched as bounded occurrences, not substrings: with options
/// `Web` and `Web Mobile`, the raw value `"Web Mobile"` selects only
/// `Web Mobile`. Longer labels claim their span of `raw` first, so a label
/// containing a comma hides the shorter labels inside it. Result order
/// follows the option list.
pub fn select_options(options: &[String], raw: &str) -> Vec<String> {
    let mut by_length: Vec<usize> = (0..options.len())
        .filter(|&i| !options[i].is_empty())
        .collect();
    by_length.sort_by_key(|&i| std::cmp::Reverse(options[i].len()));

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut selected = vec![false; options.len()];
    for i in by_length {
        let label = options[i].as_str();
        let span = raw
            .match_indices(label)
            .map(|(start, _)| (start, start + label.len()))
            .find(|&(start, end)| {
                is_bounded(raw, start, end) && !claimed.iter().any(|&(s, e)| start < e && s < end)
            });
        if let Some(span) = span {
            claimed.push(span);
            selected[i] = true;
        }
    }

    options
        .iter()
        .zip(selected)
        .filter_map(|(label, hit)| hit.then(|| label.clone()))
        .collect()
}

fn is_bounded(raw: &str, start: usize, end: usize) -> bool {
    let before = raw[..start].trim_end();
    let after = raw[end..].trim_start();
    (before.is_empty() || before.ends_with(',')) && (after.is_empty() || after.starts_with(','))
}

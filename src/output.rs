use crate::{Segment, Transcript};

/// Join segment texts in start order, one space between segments
pub fn render_captions(transcript: &Transcript) -> String {
    let mut segments: Vec<&Segment> = transcript.segments.iter().collect();
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

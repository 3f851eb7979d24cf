//! Result types returned by the conversion entry points.

use serde::Serialize;
use std::path::PathBuf;

/// What a conversion produced and where it went.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// The structured JSON file, holding the model response verbatim.
    pub json_path: PathBuf,
    /// Per-section files, in file-name order. Empty unless splitting was requested.
    pub sections: Vec<PathBuf>,
    pub stats: ConversionStats,
}

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Pages in the PDF.
    pub total_pages: usize,
    /// Selected pages that yielded text.
    pub extracted_pages: usize,
    /// Characters of text sent to the model.
    pub extracted_chars: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub extraction_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_for_json_reporting() {
        let out = ConversionOutput {
            json_path: PathBuf::from("srs.json"),
            sections: vec![PathBuf::from("srs_sections/1-Intro.json")],
            stats: ConversionStats {
                total_pages: 12,
                extracted_pages: 10,
                ..Default::default()
            },
        };
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["json_path"], "srs.json");
        assert_eq!(v["sections"][0], "srs_sections/1-Intro.json");
        assert_eq!(v["stats"]["total_pages"], 12);
        assert_eq!(v["stats"]["output_tokens"], 0);
    }
}

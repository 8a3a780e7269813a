//! Scalar-style sniffing for `patchesStrategicMerge`
//!
//! Entries of `patchesStrategicMerge` are either file paths or inline
//! patches, and only the way the scalar is written tells them apart. A
//! deserialized value has lost that information, so the entries are read
//! from the parser's event stream instead.

use yaml_rust2::parser::{Event, EventReceiver, Parser};
use yaml_rust2::scanner::{ScanError, TScalarStyle};

use crate::overlay::StrategicMergePatch;

const STRATEGIC_MERGE_KEY: &str = "patchesStrategicMerge";

/// Classify one `patchesStrategicMerge` entry
///
/// A plain scalar names a file; quoted and block scalars carry the patch.
pub(crate) fn classify_strategic_merge(value: String, style: TScalarStyle) -> StrategicMergePatch {
    match style {
        TScalarStyle::Plain => StrategicMergePatch::Path(value),
        _ => StrategicMergePatch::Inline(value),
    }
}

/// Read the `patchesStrategicMerge` entries of the first document in `source`
pub(crate) fn strategic_merge_patches(source: &str) -> Result<Vec<StrategicMergePatch>, ScanError> {
    let mut collector = StrategicMergeCollector::default();
    let mut parser = Parser::new_from_str(source);
    parser.load(&mut collector, false)?;
    Ok(collector.patches)
}

/// Walks the events of the top-level mapping
///
/// `depth` counts open collections, so the top-level mapping is depth 1 and
/// the entries of a top-level sequence are at depth 2.
#[derive(Default)]
struct StrategicMergeCollector {
    depth: usize,
    done: bool,
    expecting_key: bool,
    current_key: Option<String>,
    in_patches: bool,
    patches: Vec<StrategicMergePatch>,
}

impl StrategicMergeCollector {
    /// A complete node was read at depth 1
    fn finish_top_level_node(&mut self) {
        self.expecting_key = !self.expecting_key;
    }

    fn open_collection(&mut self, is_sequence: bool) {
        if self.depth == 1 && !self.expecting_key {
            self.in_patches =
                is_sequence && self.current_key.as_deref() == Some(STRATEGIC_MERGE_KEY);
        }
        if self.depth == 0 {
            self.expecting_key = true;
        }
        self.depth += 1;
    }

    fn close_collection(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        match self.depth {
            0 => self.done = true,
            1 => {
                self.in_patches = false;
                self.finish_top_level_node();
            }
            _ => {}
        }
    }
}

impl EventReceiver for StrategicMergeCollector {
    fn on_event(&mut self, ev: Event) {
        if self.done {
            return;
        }

        match ev {
            Event::MappingStart(..) => self.open_collection(false),
            Event::SequenceStart(..) => self.open_collection(true),
            Event::MappingEnd | Event::SequenceEnd => self.close_collection(),
            Event::Scalar(value, style, ..) => match self.depth {
                1 => {
                    if self.expecting_key {
                        self.current_key = Some(value);
                    }
                    self.finish_top_level_node();
                }
                2 if self.in_patches => {
                    self.patches.push(classify_strategic_merge(value, style));
                }
                _ => {}
            },
            Event::Alias(..) => {
                if self.depth == 1 {
                    self.finish_top_level_node();
                }
            }
            Event::DocumentEnd => self.done = true,
            _ => {}
        }
    }
}

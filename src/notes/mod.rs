mod drill;
mod graph;
mod load;

pub use drill::{
    DrillDownOutcome, DrillDownReply, DrillDownRequest, GraphDelta, NoteExpander,
    SyntheticExpander, apply_reply, spawn_drill_down,
};
pub use graph::{
    FilterSpec, LoadReport, NoteEdge, NoteGraph, NoteKind, NoteNode, SelectionSet, VisibleGraph,
    filter_visible,
};
pub use load::{NotesFile, demo_graph, load_notes_file};

/// Typed interaction/simulation events, drained by the app shell each frame.
/// Keeps controller, renderer, and simulation composable without ad hoc
/// callback registration.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    NodeClicked { id: String },
    NodeDoubleClicked { id: String },
    DrillDownRequested { id: String, generation: u64 },
    SelectionChanged { id: String, selected: bool },
    DragMoved { id: String, x: f32, y: f32 },
    SimulationConverged,
}

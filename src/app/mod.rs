use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context};

use crate::notes::{
    DrillDownOutcome, DrillDownReply, FilterSpec, NoteGraph, NotesFile, SelectionSet,
    SyntheticExpander, VisibleGraph, apply_reply, demo_graph, filter_visible, load_notes_file,
    spawn_drill_down,
};

mod engine;
mod events;
mod interaction;
mod render;
mod style;
mod ui;
mod view;
mod viewport;

use engine::{LayoutState, SimConfig, Simulation};
use events::EngineEvent;
use render::{AdaptiveRenderer, DEFAULT_RENDER_THRESHOLD};
use style::PaletteScheme;
use viewport::Viewport;

pub struct NoteMapApp {
    notes_path: Option<PathBuf>,
    state: AppState,
    reload_rx: Option<Receiver<Result<NotesFile, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<NotesFile, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    graph: NoteGraph,
    selection: SelectionSet,
    filter: FilterSpec,
    applied_filter: FilterSpec,
    visible: VisibleGraph,
    visible_dirty: bool,
    synced_generation: Option<u64>,
    layout: LayoutState,
    simulation: Simulation,
    sim_config: SimConfig,
    viewport: Viewport,
    renderer: AdaptiveRenderer,
    render_threshold: usize,
    force_performance: bool,
    scheme: PaletteScheme,
    lens_depth: u32,
    lens_enabled: bool,
    cap_enabled: bool,
    cap_nodes: usize,
    expander: Arc<dyn crate::notes::NoteExpander>,
    pending_drill: Option<PendingDrill>,
    hovered: Option<usize>,
    drag: Option<DragState>,
    details: Option<String>,
    events: Vec<EngineEvent>,
    status: Option<String>,
}

struct PendingDrill {
    node_id: String,
    rx: Receiver<DrillDownReply>,
}

struct DragState {
    /// Tracked by id, not index: a drill-down landing mid-drag reshuffles
    /// layout indices.
    id: String,
}

impl ViewModel {
    fn new(file: NotesFile) -> Self {
        let mut graph = NoteGraph::default();
        let report = graph.load(file.nodes, file.edges);
        log::info!(
            "model loaded: {} node(s), {} edge(s)",
            report.nodes_loaded,
            report.edges_loaded
        );

        Self {
            graph,
            selection: SelectionSet::default(),
            filter: FilterSpec::default(),
            applied_filter: FilterSpec::default(),
            visible: VisibleGraph::default(),
            visible_dirty: true,
            synced_generation: None,
            layout: LayoutState::default(),
            simulation: Simulation::new(),
            sim_config: SimConfig::default(),
            viewport: Viewport::default(),
            renderer: AdaptiveRenderer::default(),
            render_threshold: DEFAULT_RENDER_THRESHOLD,
            force_performance: false,
            scheme: PaletteScheme::default(),
            lens_depth: 3,
            lens_enabled: false,
            cap_enabled: false,
            cap_nodes: 1500,
            expander: Arc::new(SyntheticExpander),
            pending_drill: None,
            hovered: None,
            drag: None,
            details: None,
            events: Vec::new(),
            status: None,
        }
    }

    /// Folds the side-panel filter controls into the FilterSpec consumed by
    /// `filter_visible`; comparing old vs. new is what drives resyncs.
    fn effective_filter(&self) -> FilterSpec {
        FilterSpec {
            search: self.filter.search.clone(),
            max_depth: self.lens_enabled.then_some(self.lens_depth),
            node_cap: self.cap_enabled.then_some(self.cap_nodes),
        }
    }

    /// Recomputes the visible snapshot and layout when the model generation
    /// or the filter changed. Any material change reheats the simulation.
    fn sync_model(&mut self) {
        let filter = self.effective_filter();
        let generation_changed = self.synced_generation != Some(self.graph.generation());
        if !generation_changed && filter == self.applied_filter && !self.visible_dirty {
            return;
        }

        self.visible = filter_visible(&self.graph, &filter, &self.selection);
        self.layout.sync(&self.graph, &self.visible, |node| {
            style::node_radius(node.kind, node.depth)
        });
        self.synced_generation = Some(self.graph.generation());
        self.applied_filter = filter;
        self.visible_dirty = false;
        self.simulation.reheat();

        if let Some(id) = &self.details
            && !self.graph.contains(id)
        {
            self.details = None;
        }
    }

    fn start_drill_down(&mut self, id: String, generation: u64) {
        if self.pending_drill.is_some() {
            self.status = Some("A drill-down is already running".to_owned());
            return;
        }
        let Some(node) = self.graph.node(&id).cloned() else {
            return;
        };

        log::info!("requesting drill-down for {id}");
        let rx = spawn_drill_down(Arc::clone(&self.expander), node, generation);
        self.pending_drill = Some(PendingDrill { node_id: id, rx });
    }

    /// Polled every frame; replies mutate the model only here, on the UI
    /// thread.
    fn poll_drill_down(&mut self) {
        let Some(pending) = self.pending_drill.take() else {
            return;
        };

        match pending.rx.try_recv() {
            Ok(reply) => match apply_reply(&mut self.graph, reply) {
                DrillDownOutcome::Applied(report) => {
                    self.status = Some(format!(
                        "Expanded {} with {} note(s)",
                        pending.node_id, report.nodes_loaded
                    ));
                }
                DrillDownOutcome::Empty => {
                    self.status = Some(format!("No further detail for {}", pending.node_id));
                }
                DrillDownOutcome::Stale => {}
                DrillDownOutcome::Failed(error) => {
                    self.status = Some(format!("Drill-down failed: {error}"));
                }
            },
            Err(TryRecvError::Empty) => {
                self.pending_drill = Some(pending);
            }
            Err(TryRecvError::Disconnected) => {
                self.status = Some("Drill-down worker disconnected".to_owned());
            }
        }
    }

    /// Drains the typed event queue. Interaction emits events; their effects
    /// on the model happen here, keeping the controller free of collaborator
    /// wiring.
    fn process_events(&mut self) {
        let events = std::mem::take(&mut self.events);
        for event in events {
            match event {
                EngineEvent::DrillDownRequested { id, generation } => {
                    self.start_drill_down(id, generation);
                }
                EngineEvent::NodeDoubleClicked { id } => {
                    self.details = Some(id);
                }
                EngineEvent::SelectionChanged { id, selected } => {
                    log::debug!("selection changed: {id} -> {selected}");
                    // The cap's importance bonus depends on selection.
                    if self.effective_filter().node_cap.is_some() {
                        self.visible_dirty = true;
                    }
                }
                EngineEvent::NodeClicked { id } => {
                    log::trace!("node clicked: {id}");
                }
                EngineEvent::DragMoved { id, x, y } => {
                    log::trace!("drag moved {id} to ({x:.1}, {y:.1})");
                }
                EngineEvent::SimulationConverged => {
                    log::debug!("simulation converged");
                }
            }
        }
    }
}

impl NoteMapApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, notes_path: Option<PathBuf>) -> Self {
        let state = Self::start_load(notes_path.clone());
        Self {
            notes_path,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(notes_path: Option<PathBuf>) -> Receiver<Result<NotesFile, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = match notes_path {
                Some(path) => load_notes_file(&path).map_err(|error| error.to_string()),
                None => Ok(demo_graph()),
            };
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(notes_path: Option<PathBuf>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(notes_path),
        }
    }
}

impl eframe::App for NoteMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(file)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(file))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading notes graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load notes graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.notes_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.notes_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(file) => AppState::Ready(Box::new(ViewModel::new(file))),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

use super::{load_document, Format};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use designer_common::{read_json_file, ExpandedId, FrameId, NodeId, Point, Rect};
use designer_document::{Document, ParentIndex};
use designer_interaction::{
    DragSession, DropCommitPlan, DropConfig, DropContext, DropIntent, DropResolution, FramePositionProvider,
    GeometryProvider, HitTestProvider,
};
use designer_scene::{expand_frame, ExpandedScene, LookupIndex};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DropArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Frame the drag happens in
    pub frame_id: String,

    /// Frame-local bounds per expanded id, as a JSON object of rects
    pub bounds: PathBuf,

    /// Node to drag (repeat for a multi-selection)
    #[arg(short, long = "node", required = true)]
    pub nodes: Vec<String>,

    /// Release point, world x
    #[arg(short)]
    pub x: f64,

    /// Release point, world y
    #[arg(short)]
    pub y: f64,

    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

/// Laid-out frame as measured by a renderer
pub(crate) struct Snapshot {
    scene: ExpandedScene,
    lookup: LookupIndex,
    bounds: BTreeMap<ExpandedId, Rect>,
    origin: Point,
}

impl Snapshot {
    pub(crate) fn new(document: &Document, frame_id: &FrameId, bounds: BTreeMap<ExpandedId, Rect>) -> Result<Self> {
        let frame = document
            .frame(frame_id)
            .ok_or_else(|| anyhow!("frame `{}` does not exist", frame_id))?;
        let scene = expand_frame(document, frame_id).ok_or_else(|| anyhow!("frame `{}` does not exist", frame_id))?;
        let lookup = LookupIndex::build(&scene);
        Ok(Self {
            scene,
            lookup,
            bounds,
            origin: frame.position,
        })
    }

    fn ctx<'a>(&'a self, document: &'a Document) -> DropContext<'a> {
        DropContext {
            document,
            scene: &self.scene,
            lookup: &self.lookup,
            geometry: self,
            frames: self,
            hits: self,
        }
    }
}

impl GeometryProvider for Snapshot {
    fn bounds(&self, _frame_id: &FrameId, id: &ExpandedId) -> Option<Rect> {
        self.bounds.get(id).copied()
    }
}

impl FramePositionProvider for Snapshot {
    fn world_position(&self, _frame_id: &FrameId) -> Point {
        self.origin
    }
}

impl HitTestProvider for Snapshot {
    /// Topmost node under `point`: the last one in paint order
    fn hit_test(&self, _frame_id: &FrameId, point: Point, exclude: &[ExpandedId]) -> Option<ExpandedId> {
        let local = Point::new(point.x - self.origin.x, point.y - self.origin.y);
        self.scene
            .walk()
            .into_iter()
            .filter(|(_, node)| !exclude.iter().any(|ex| self.lookup.is_ancestor_or_self(ex, &node.id)))
            .filter(|(_, node)| self.bounds.get(&node.id).is_some_and(|b| b.contains(local)))
            .last()
            .map(|(_, node)| node.id.clone())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DropOutcome {
    pub resolution: DropResolution,
    pub plan: Option<DropCommitPlan>,
}

/// Runs one drag gesture from pick-up to release at `cursor`
pub(crate) fn simulate(
    document: &Document,
    snapshot: &Snapshot,
    frame_id: &FrameId,
    nodes: &[NodeId],
    cursor: Point,
    zoom: f64,
    config: &DropConfig,
) -> Result<DropOutcome> {
    let ctx = snapshot.ctx(document);
    let parents = ParentIndex::build(document);

    let mut session = DragSession::new(config.clone());
    session.begin(frame_id.clone(), nodes, &parents, &ctx)?;
    let resolution = session.update(cursor, zoom, &ctx)?.clone();
    let plan = session.commit()?;

    Ok(DropOutcome { resolution, plan })
}

pub fn drop(args: DropArgs, config: &DropConfig) -> Result<()> {
    let document = load_document(&args.document)?;
    let frame_id = FrameId::new(args.frame_id);
    let bounds: BTreeMap<ExpandedId, Rect> =
        read_json_file(&args.bounds).with_context(|| format!("Cannot load bounds {}", args.bounds.display()))?;
    let nodes: Vec<NodeId> = args.nodes.into_iter().map(NodeId::new).collect();

    let snapshot = Snapshot::new(&document, &frame_id, bounds)?;
    let outcome = simulate(
        &document,
        &snapshot,
        &frame_id,
        &nodes,
        Point::new(args.x, args.y),
        args.zoom,
        config,
    )?;

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        Format::Text => print!("{}", render_outcome(&outcome)?),
    }
    Ok(())
}

fn render_outcome(outcome: &DropOutcome) -> Result<String> {
    let (Some(preview), Some(plan)) = (outcome.resolution.preview(), &outcome.plan) else {
        let reason = outcome
            .resolution
            .invalid_reason()
            .map_or_else(|| "no preview".to_string(), |reason| reason.to_string());
        return Ok(format!("{} no drop: {}\n", "✗".red(), reason));
    };

    let intent = match preview.intent {
        DropIntent::None => "insert",
        DropIntent::Reorder => "reorder",
        DropIntent::Reparent => "reparent",
    };
    let r = preview.indicator;
    let mut out = format!(
        "{} {} into `{}` at index {}\n  indicator: x={} y={} w={} h={}\n",
        "✓".green(),
        intent,
        preview.target_node,
        preview.insertion_index,
        r.x,
        r.y,
        r.width,
        r.height
    );
    out.push_str(&serde_json::to_string_pretty(&plan.to_patches())?);
    out.push('\n');
    Ok(out)
}

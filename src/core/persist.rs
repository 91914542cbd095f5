//! The save-file boundary: serde records mirroring the document layout
//! the editor's writer produces.
//!
//! Ids in a document are file-local. Capturing mints one counter over
//! modules and their ports in registry order, so the same model always
//! captures to the same record stream. Each module's ports are listed
//! in two buckets, the input face and the output face, with committed
//! bidir ports filed by the face they sit on; restore pairs bucket
//! entries positionally with a freshly built module of the same kind.

use std::collections::{BTreeMap, HashMap};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::context::{SimContext, ViewState};
use crate::core::error::PersistError;
use crate::core::geom::{Vec2, WirePath};
use crate::core::modules::{Module, ModuleKind};
use crate::core::port::{PortKind, Side};
use crate::core::types::{PortIx, PortRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimDocument {
    pub view: ViewRecord,
    pub modules: Vec<ModuleRecord>,
    pub links: Vec<LinkRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub cam_x: f64,
    pub cam_y: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: u32,
    /// Stable kind name; these strings outlive any refactor.
    pub kind: String,
    pub pos: Vec2,
    pub orient: u8,
    pub inputs: Vec<u32>,
    pub outputs: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub src: u32,
    pub targ: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ctrl_pts: Vec<Vec2>,
}

/// Port indices split by face: unidirectional ports first in
/// declaration order, then bidirs of that face. Capture and restore
/// must agree on this ordering, which is why it lives in one place.
fn face_buckets(module: &Module) -> (Vec<PortIx>, Vec<PortIx>) {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    for (ix, port) in module.ports.iter().enumerate() {
        match port.kind {
            PortKind::Input { .. } => inputs.push(ix),
            PortKind::Output => outputs.push(ix),
            PortKind::Bidir => {}
        }
    }
    for (ix, port) in module.ports.iter().enumerate() {
        if matches!(port.kind, PortKind::Bidir) {
            match port.side {
                Side::Face => inputs.push(ix),
                Side::Back => outputs.push(ix),
            }
        }
    }
    (inputs, outputs)
}

/// Snapshots the whole context as a document.
pub fn capture(cx: &SimContext) -> SimDocument {
    let mut next = 0u32;
    let mut port_ids: HashMap<PortRef, u32> = HashMap::new();
    let mut modules = Vec::new();

    for module in cx.sim.modules() {
        let file_id = next;
        next += 1;
        for ix in 0..module.ports.len() {
            port_ids.insert(PortRef::new(module.id, ix), next);
            next += 1;
        }

        let (ins, outs) = face_buckets(module);
        let id_of = |ix: &PortIx| port_ids[&PortRef::new(module.id, *ix)];
        modules.push(ModuleRecord {
            id: file_id,
            kind: module.kind().file_name().to_string(),
            pos: module.pos,
            orient: module.orient,
            inputs: ins.iter().map(id_of).collect(),
            outputs: outs.iter().map(id_of).collect(),
            data: module.data_out(),
        });
    }

    let mut links = Vec::new();
    for (_, link) in cx.sim.links() {
        match (port_ids.get(&link.src), port_ids.get(&link.targ)) {
            (Some(&src), Some(&targ)) => links.push(LinkRecord {
                src,
                targ,
                ctrl_pts: link.path.points.clone(),
            }),
            _ => warn!("skipping a link with a dangling endpoint at save"),
        }
    }

    SimDocument {
        view: ViewRecord {
            cam_x: cx.view.cam.x,
            cam_y: cx.view.cam.y,
            zoom: cx.view.zoom,
        },
        modules,
        links,
    }
}

/// Rebuilds a context from a document. Links go through the guarded
/// factory, so a document describing an illegal wiring is rejected
/// rather than loaded in a broken state.
pub fn restore(doc: &SimDocument) -> Result<SimContext, PersistError> {
    let mut cx = SimContext::new();
    let mut ports: HashMap<u32, PortRef> = HashMap::new();

    for record in &doc.modules {
        let kind = ModuleKind::from_file_name(&record.kind)
            .ok_or_else(|| PersistError::UnknownKind(record.kind.clone()))?;
        let id = cx.sim.add_module(kind, record.pos);
        if let Some(m) = cx.sim.module_mut(id) {
            m.orient = record.orient % 4;
        }

        let Some(module) = cx.sim.module(id) else {
            continue;
        };
        let (ins, outs) = face_buckets(module);
        if record.inputs.len() != ins.len() || record.outputs.len() != outs.len() {
            return Err(PersistError::BadData {
                kind: record.kind.clone(),
                detail: format!(
                    "expected {}+{} ports, document lists {}+{}",
                    ins.len(),
                    outs.len(),
                    record.inputs.len(),
                    record.outputs.len()
                ),
            });
        }
        for (&file_id, ix) in record.inputs.iter().zip(ins) {
            ports.insert(file_id, PortRef::new(id, ix));
        }
        for (&file_id, ix) in record.outputs.iter().zip(outs) {
            ports.insert(file_id, PortRef::new(id, ix));
        }

        if let Some(data) = &record.data {
            if let Some(m) = cx.sim.module_mut(id) {
                m.data_in(data).map_err(|detail| PersistError::BadData {
                    kind: record.kind.clone(),
                    detail,
                })?;
            }
        }
    }

    for record in &doc.links {
        let src = *ports
            .get(&record.src)
            .ok_or(PersistError::DanglingPort(record.src))?;
        let targ = *ports
            .get(&record.targ)
            .ok_or(PersistError::DanglingPort(record.targ))?;
        cx.create_link(src, targ, WirePath::from_points(record.ctrl_pts.clone()))?;
    }

    // Loading is not an edit; the history starts clean.
    cx.ops.clear();
    cx.sim.clear_errors();
    cx.sim.settle();
    cx.view = ViewState {
        cam: Vec2::new(doc.view.cam_x, doc.view.cam_y),
        zoom: doc.view.zoom,
    };
    info!(
        "restored {} modules and {} links",
        doc.modules.len(),
        doc.links.len()
    );
    Ok(cx)
}

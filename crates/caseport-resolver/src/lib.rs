//! Shared-step / test-case reference resolution.
//!
//! Converts source items into canonical test cases and shared steps. A call
//! step either becomes a reference to a shared step or an inline copy of the
//! callee's steps, depending on [`CallPolicy`]. Callees that were never seen
//! are fetched on demand; callees already converted as test cases are
//! reclassified as shared steps under the same id.
//!
//! Conversion runs on an explicit stack of frames, one per item in flight.
//! The stack's source ids are the set of items currently resolving, so a call
//! into any of them is a cycle.

mod frame;
mod mapping;

use caseport_attachments::AttachmentDownloader;
use caseport_attributes::AttributeAggregator;
use caseport_error::{ExportError, Result};
use caseport_ids::{CanonicalId, SourceId};
use caseport_ports::{AttachmentRecord, CallMode, ItemRecord, SinkWriter, SourceClient, SourceStep};
use caseport_schema::{Attribute, Root, Section, SharedStep, Step, TestCase};
use caseport_sections::SectionTree;
use frame::{Block, Frame, PendingCall, Staged};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

pub use mapping::{map_priority, map_state};

/// How call steps are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPolicy {
    /// Every call becomes a `sharedStepId` reference.
    #[default]
    Reference,
    /// Every call is replaced by a blank step followed by the callee's steps.
    InlineCopy,
    /// Follow the link/copy mode the source declares on each call.
    PerStep,
}

impl CallPolicy {
    pub fn mode_for(&self, declared: CallMode) -> CallMode {
        match self {
            Self::Reference => CallMode::Link,
            Self::InlineCopy => CallMode::Copy,
            Self::PerStep => declared,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    TestCase,
    SharedStep,
}

/// Outcome of [`Resolver::convert_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Converted(CanonicalId),
    /// The item was already converted, e.g. as the callee of an earlier item.
    AlreadyClassified(CanonicalId),
}

impl Conversion {
    pub fn id(&self) -> CanonicalId {
        match self {
            Self::Converted(id) | Self::AlreadyClassified(id) => *id,
        }
    }
}

/// Everything one resolver produced, ready to be written.
#[derive(Debug, Clone)]
pub struct ResolvedExport {
    pub test_cases: Vec<TestCase>,
    pub shared_steps: Vec<SharedStep>,
    pub attributes: Vec<Attribute>,
    pub sections: Vec<Section>,
}

impl ResolvedExport {
    /// Manifest listing every item by id.
    pub fn root(&self, project_name: &str) -> Root {
        Root {
            sections: self.sections.clone(),
            test_cases: self.test_cases.iter().map(|t| t.id).collect(),
            shared_steps: self.shared_steps.iter().map(|s| s.id).collect(),
            attributes: self.attributes.clone(),
            ..Root::new(project_name)
        }
    }
}

/// Per-export conversion state.
///
/// One instance per export or batch; nothing is shared between instances.
pub struct Resolver<'a> {
    client: &'a dyn SourceClient,
    sink: &'a dyn SinkWriter,
    sections: SectionTree,
    attributes: AttributeAggregator,
    downloader: AttachmentDownloader,
    policy: CallPolicy,
    test_cases: HashMap<SourceId, TestCase>,
    shared_steps: HashMap<SourceId, SharedStep>,
    order: Vec<SourceId>,
    reclassified: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(
        client: &'a dyn SourceClient,
        sink: &'a dyn SinkWriter,
        sections: SectionTree,
        attributes: AttributeAggregator,
    ) -> Self {
        Self {
            client,
            sink,
            sections,
            attributes,
            downloader: AttachmentDownloader::default(),
            policy: CallPolicy::default(),
            test_cases: HashMap::new(),
            shared_steps: HashMap::new(),
            order: Vec::new(),
            reclassified: 0,
        }
    }

    pub fn with_call_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_downloader(mut self, downloader: AttachmentDownloader) -> Self {
        self.downloader = downloader;
        self
    }

    /// Convert one listed item and everything it calls.
    ///
    /// On error the item and any callee still in flight are dropped together
    /// with the attachments stored for them; callees that completed before
    /// the failure stay converted. Attributes and sections only change when
    /// an item completes.
    pub fn convert_root(&mut self, record: ItemRecord) -> Result<Conversion> {
        if let Some((_, id)) = self.classification(&record.id) {
            debug!(item = %record.id, "already classified; skipping");
            return Ok(Conversion::AlreadyClassified(id));
        }
        let kind = if record.is_shared {
            Classification::SharedStep
        } else {
            Classification::TestCase
        };
        let mut stack = vec![self.open_frame(record, kind)];
        match self.drive(&mut stack) {
            Ok(id) => Ok(Conversion::Converted(id)),
            Err(e) => {
                for frame in &stack {
                    self.discard(frame.item.id);
                }
                Err(e)
            }
        }
    }

    fn drive(&mut self, stack: &mut Vec<Frame>) -> Result<CanonicalId> {
        loop {
            let top = stack.len() - 1;

            if let Some(call) = stack[top].waiting.take() {
                let (caller_id, owner) = (stack[top].source_id.clone(), stack[top].item.id);
                let steps = self
                    .resolve_known(&caller_id, owner, &call.callee, call.mode)?
                    .ok_or(ExportError::UnresolvedReference {
                        caller: caller_id,
                        callee: call.callee,
                    })?;
                stack[top].extend(call.block, steps);
                continue;
            }

            let Some((block, step)) = stack[top].next_step() else {
                let frame = stack.swap_remove(top);
                let id = self.close_frame(frame)?;
                if stack.is_empty() {
                    return Ok(id);
                }
                continue;
            };

            let Some(call) = step.call.clone() else {
                let owner = stack[top].item.id;
                let converted = self.content_step(owner, &step)?;
                stack[top].extend(block, [converted]);
                continue;
            };

            if let Some(pos) = stack.iter().position(|f| f.source_id == call.target) {
                let mut chain: Vec<SourceId> =
                    stack[pos..].iter().map(|f| f.source_id.clone()).collect();
                chain.push(call.target);
                return Err(ExportError::CycleDetected { chain });
            }

            let mode = self.policy.mode_for(call.mode);
            let (caller_id, owner) = (stack[top].source_id.clone(), stack[top].item.id);
            if let Some(steps) = self.resolve_known(&caller_id, owner, &call.target, mode)? {
                stack[top].extend(block, steps);
                continue;
            }

            let mut record = self.fetch(&caller_id, &call.target)?;
            if record.id != call.target {
                debug!(requested = %call.target, returned = %record.id, "source returned a different id; keeping the requested one");
                record.id = call.target.clone();
            }
            let kind = if mode == CallMode::Link || record.is_shared {
                Classification::SharedStep
            } else {
                Classification::TestCase
            };
            debug!(caller = %caller_id, callee = %call.target, ?kind, "converting callee on demand");
            stack[top].waiting = Some(PendingCall {
                block,
                callee: call.target,
                mode,
            });
            let callee = self.open_frame(record, kind);
            stack.push(callee);
        }
    }

    /// Steps for a call whose callee is already converted, or `None`.
    fn resolve_known(
        &mut self,
        caller: &SourceId,
        owner: CanonicalId,
        callee: &SourceId,
        mode: CallMode,
    ) -> Result<Option<Vec<Step>>> {
        match mode {
            CallMode::Link => {
                if let Some(shared) = self.shared_steps.get(callee) {
                    return Ok(Some(vec![Step::reference(shared.id)]));
                }
                if self.test_cases.contains_key(callee) {
                    let id = self.reclassify(caller, callee)?;
                    return Ok(Some(vec![Step::reference(id)]));
                }
                Ok(None)
            }
            CallMode::Copy => {
                let body = if let Some(shared) = self.shared_steps.get(callee) {
                    (shared.id, shared.steps.clone())
                } else if let Some(tc) = self.test_cases.get(callee) {
                    (tc.id, tc.steps.clone())
                } else {
                    return Ok(None);
                };
                self.inline_copy(body.0, body.1, owner).map(Some)
            }
        }
    }

    /// Move a converted test case into the shared-step table, keeping its id.
    fn reclassify(&mut self, caller: &SourceId, callee: &SourceId) -> Result<CanonicalId> {
        let tc = self
            .test_cases
            .remove(callee)
            .ok_or_else(|| ExportError::UnresolvedReference {
                caller: caller.clone(),
                callee: callee.clone(),
            })?;
        let shared = SharedStep::from_test_case(tc);
        let id = shared.id;
        debug!(item = %callee, id = %id, caller = %caller, "reclassified test case as shared step");
        self.shared_steps.insert(callee.clone(), shared);
        self.reclassified += 1;
        Ok(id)
    }

    /// Blank connecting step, then the callee's steps with attachments owned by `owner`.
    fn inline_copy(
        &self,
        callee: CanonicalId,
        steps: Vec<Step>,
        owner: CanonicalId,
    ) -> Result<Vec<Step>> {
        let mut out = Vec::with_capacity(steps.len() + 1);
        out.push(Step::default());
        for mut step in steps {
            for names in [
                &mut step.action_attachments,
                &mut step.expected_attachments,
                &mut step.test_data_attachments,
            ] {
                for name in names.iter_mut() {
                    *name = self
                        .sink
                        .copy_attachment(callee, owner, name)
                        .map_err(ExportError::sink)?;
                }
            }
            out.push(step);
        }
        Ok(out)
    }

    fn content_step(&self, owner: CanonicalId, step: &SourceStep) -> Result<Step> {
        Ok(Step {
            action: step.action.clone(),
            expected: step.expected.clone(),
            test_data: step.test_data.clone(),
            action_attachments: self.download(owner, &step.action_attachments)?,
            expected_attachments: self.download(owner, &step.expected_attachments)?,
            test_data_attachments: self.download(owner, &step.test_data_attachments)?,
            shared_step_id: None,
        })
    }

    fn download(&self, owner: CanonicalId, records: &[AttachmentRecord]) -> Result<Vec<String>> {
        self.downloader
            .download_all(self.client, self.sink, owner, records)
    }

    fn fetch(&self, caller: &SourceId, callee: &SourceId) -> Result<ItemRecord> {
        self.client
            .get_item(callee)
            .map_err(|e| ExportError::source_fetch("get_item", callee, e))?
            .ok_or_else(|| ExportError::UnresolvedReference {
                caller: caller.clone(),
                callee: callee.clone(),
            })
    }

    fn open_frame(&self, record: ItemRecord, kind: Classification) -> Frame {
        let mut item = TestCase::new(CanonicalId::new(), record.name, CanonicalId::default());
        item.description = record.description;
        item.state = map_state(record.state.as_deref());
        item.priority = map_priority(record.priority.as_deref());
        item.tags = record.tags;
        item.links = record.links;
        item.iterations = record.iterations;
        item.duration = record.duration.unwrap_or_default();

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(record.fields.len());
        for field in record.fields {
            if !seen.insert(field.name.clone()) {
                debug!(item = %record.id, field = %field.name, "field repeated on one item; keeping the first");
                continue;
            }
            fields.push(field);
        }

        Frame::new(
            record.id,
            kind,
            item,
            Staged {
                fields,
                section_id: record.section_id,
                section_path: record.section_path,
            },
            [
                (Block::Pre, record.preconditions),
                (Block::Main, record.steps),
                (Block::Post, record.postconditions),
            ],
        )
    }

    fn close_frame(&mut self, frame: Frame) -> Result<CanonicalId> {
        let owner = frame.item.id;
        self.commit(frame).inspect_err(|_| self.discard(owner))
    }

    /// Finish one item: attachments, attribute bindings, section, then store.
    fn commit(&mut self, frame: Frame) -> Result<CanonicalId> {
        let Frame {
            source_id,
            kind,
            mut item,
            staged,
            ..
        } = frame;

        let records = self
            .client
            .get_attachments(&source_id)
            .map_err(|e| ExportError::source_fetch("get_attachments", &source_id, e))?;
        item.attachments = self.download(item.id, &records)?;
        item.attributes = self.attributes.register_item(&staged.fields)?;
        item.section_id = self
            .sections
            .resolve(staged.section_id.as_ref(), staged.section_path.as_deref());

        let id = item.id;
        match kind {
            Classification::TestCase => {
                self.test_cases.insert(source_id.clone(), item);
            }
            Classification::SharedStep => {
                let state = item.state;
                let mut shared = SharedStep::from_test_case(item);
                shared.state = state;
                self.shared_steps.insert(source_id.clone(), shared);
            }
        }
        debug!(item = %source_id, id = %id, ?kind, "converted");
        self.order.push(source_id);
        Ok(id)
    }

    /// Drop what the sink holds for an item that will not be written.
    fn discard(&self, owner: CanonicalId) {
        if let Err(e) = self.sink.discard(owner) {
            warn!(id = %owner, error = %e, "could not discard attachments of an abandoned item");
        }
    }

    /// Current classification and canonical id of a source item.
    pub fn classification(&self, source: &SourceId) -> Option<(Classification, CanonicalId)> {
        if let Some(tc) = self.test_cases.get(source) {
            return Some((Classification::TestCase, tc.id));
        }
        self.shared_steps
            .get(source)
            .map(|s| (Classification::SharedStep, s.id))
    }

    pub fn test_case(&self, source: &SourceId) -> Option<&TestCase> {
        self.test_cases.get(source)
    }

    pub fn shared_step(&self, source: &SourceId) -> Option<&SharedStep> {
        self.shared_steps.get(source)
    }

    /// Number of test cases turned into shared steps so far.
    pub fn reclassified(&self) -> usize {
        self.reclassified
    }

    pub fn sections(&self) -> &SectionTree {
        &self.sections
    }

    pub fn attributes(&self) -> &AttributeAggregator {
        &self.attributes
    }

    /// Finalize: backfill attribute bindings and hand everything over in conversion order.
    pub fn finish(mut self) -> ResolvedExport {
        let mut test_cases = Vec::with_capacity(self.test_cases.len());
        let mut shared_steps = Vec::with_capacity(self.shared_steps.len());
        for source in &self.order {
            if let Some(mut tc) = self.test_cases.remove(source) {
                self.attributes.backfill(&mut tc.attributes);
                test_cases.push(tc);
            } else if let Some(mut shared) = self.shared_steps.remove(source) {
                self.attributes.backfill(&mut shared.attributes);
                shared_steps.push(shared);
            }
        }
        ResolvedExport {
            test_cases,
            shared_steps,
            attributes: self.attributes.into_attributes(),
            sections: self.sections.into_sections(),
        }
    }
}

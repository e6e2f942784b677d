use caseport_ids::SourceId;
use caseport_ports::{
    AttachmentRecord, CallMode, FieldValue, ItemRecord, SectionRecord, SourceField, SourceStep,
};

pub fn flat_section(id: &str, name: &str, parent: Option<&str>) -> SectionRecord {
    SectionRecord {
        id: id.into(),
        name: name.into(),
        parent_id: parent.map(SourceId::from),
        description: None,
    }
}

pub fn attachment(id: &str, name: &str) -> AttachmentRecord {
    AttachmentRecord {
        id: id.into(),
        name: name.into(),
        path: None,
    }
}

pub fn item(id: &str, name: &str) -> ItemBuilder {
    ItemBuilder {
        record: ItemRecord::new(id, name),
    }
}

/// Fluent [`ItemRecord`] construction.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    record: ItemRecord,
}

impl ItemBuilder {
    pub fn in_section(mut self, section: &str) -> Self {
        self.record.section_id = Some(section.into());
        self
    }

    pub fn at_path(mut self, path: &str) -> Self {
        self.record.section_path = Some(path.into());
        self
    }

    pub fn shared(mut self) -> Self {
        self.record.is_shared = true;
        self
    }

    pub fn state(mut self, state: &str) -> Self {
        self.record.state = Some(state.into());
        self
    }

    pub fn priority(mut self, priority: &str) -> Self {
        self.record.priority = Some(priority.into());
        self
    }

    pub fn step(mut self, action: &str, expected: &str) -> Self {
        self.record.steps.push(SourceStep::text(action, expected));
        self
    }

    pub fn raw_step(mut self, step: SourceStep) -> Self {
        self.record.steps.push(step);
        self
    }

    pub fn precondition(mut self, action: &str) -> Self {
        self.record.preconditions.push(SourceStep::text(action, ""));
        self
    }

    /// A linked call step.
    pub fn call(self, target: &str) -> Self {
        self.raw_step(SourceStep::call(target, CallMode::Link))
    }

    /// A call step the source marks as copy-inline.
    pub fn copy_call(self, target: &str) -> Self {
        self.raw_step(SourceStep::call(target, CallMode::Copy))
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.record.tags.push(tag.into());
        self
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.record.fields.push(SourceField::text(name, value));
        self
    }

    pub fn required_field(mut self, name: &str, value: &str) -> Self {
        let mut field = SourceField::text(name, value);
        field.required = true;
        self.record.fields.push(field);
        self
    }

    pub fn checkbox(mut self, name: &str, checked: bool) -> Self {
        self.record.fields.push(SourceField {
            name: name.into(),
            value: Some(FieldValue::Bool(checked)),
            options: Vec::new(),
            required: false,
        });
        self
    }

    /// A field the source lists with a null value.
    pub fn blank_field(mut self, name: &str) -> Self {
        self.record.fields.push(SourceField {
            name: name.into(),
            value: None,
            options: Vec::new(),
            required: false,
        });
        self
    }

    pub fn build(self) -> ItemRecord {
        self.record
    }
}

use super::{BatchJob, Job, JobState};
use crate::context::EditorContext;
use crate::error::EditError;
use crate::selection::SelectionGroup;
use sd_core::{NodeId, PropertyName, PropertyValue, ValidationError};

/// Set or remove one text property.
///
/// Records the previous text and its position in the node's property order,
/// so undo restores the attribute exactly where it was. Setting a property
/// to the value it already has is still a job.
#[derive(Debug)]
pub struct ModifyPropertyJob {
    node: NodeId,
    property: PropertyName,
    value: Option<String>,
    previous: Option<String>,
    position: Option<usize>,
    state: JobState,
}

impl ModifyPropertyJob {
    pub fn new(node: NodeId, property: PropertyName, value: Option<String>) -> Self {
        Self {
            node,
            property,
            value,
            previous: None,
            position: None,
            state: JobState::Fresh,
        }
    }

    pub fn set(node: NodeId, property: PropertyName, value: impl Into<String>) -> Self {
        Self::new(node, property, Some(value.into()))
    }

    pub fn remove(node: NodeId, property: PropertyName) -> Self {
        Self::new(node, property, None)
    }
}

impl Job for ModifyPropertyJob {
    fn is_executable(&mut self, ctx: &EditorContext) -> bool {
        ctx.document.node(self.node).is_some_and(|node| {
            node.is_resolved()
                && !matches!(node.properties.get(&self.property), Some(PropertyValue::Nodes(_)))
        })
    }

    fn execute(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        self.position = ctx.document.property_position(self.node, &self.property);
        self.previous = ctx
            .document
            .set_text_property(self.node, self.property, self.value.clone());
    }

    fn undo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Undone);
        ctx.document
            .set_text_property(self.node, self.property, self.previous.clone());
        if let Some(position) = self.position {
            ctx.document.move_property(self.node, &self.property, position);
        }
    }

    fn redo(&mut self, ctx: &mut EditorContext) {
        self.state.advance(JobState::Executed);
        ctx.document
            .set_text_property(self.node, self.property, self.value.clone());
    }

    fn description(&self) -> String {
        match self.value {
            Some(_) => format!("Set {}", self.property),
            None => format!("Clear {}", self.property),
        }
    }
}

/// Validate `raw` for `property` on every selected object and build one
/// batch setting it. `None` removes the property instead.
///
/// A grid selection edits the constraint objects of the selected lines.
pub fn modify_selection(
    ctx: &EditorContext,
    property: PropertyName,
    raw: Option<&str>,
) -> Result<BatchJob, EditError> {
    let targets: Vec<NodeId> = match ctx.selection.group() {
        None => return Err(EditError::NothingSelected),
        Some(SelectionGroup::Objects(objects)) => objects.items().to_vec(),
        Some(SelectionGroup::Grid(grid)) => {
            let constraints = ctx.mask(grid.target()).grid_constraints(grid.axis());
            grid.indexes()
                .iter()
                .filter_map(|i| constraints.get(*i).copied())
                .collect()
        }
    };
    if targets.is_empty() {
        return Err(EditError::NotExecutable);
    }

    let validation = ctx.validation_context();
    let mut batch = BatchJob::new(match raw {
        Some(_) => format!("Set {property}"),
        None => format!("Clear {property}"),
    });
    for target in targets {
        let class = ctx.document.class_of(target).ok_or(EditError::NotExecutable)?;
        let parent = ctx.parent_class(target);
        let value = match raw {
            Some(raw) => Some(
                ctx.registry
                    .validate(class, parent, &property, raw, &validation)?
                    .to_markup(),
            ),
            None => {
                ctx.registry
                    .property(class, parent, &property)
                    .ok_or_else(|| ValidationError::UnknownProperty(property.to_string()))?;
                None
            }
        };
        batch.push(ModifyPropertyJob::new(target, property, value));
    }
    Ok(batch)
}

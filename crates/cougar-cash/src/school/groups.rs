use serde::{Deserialize, Serialize};

use super::domain::{AdminPermission, GroupKind, StudentGroup};
use super::state::{record_id, SchoolError, SchoolState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDraft {
    pub name: String,
    #[serde(default)]
    pub kind: GroupKind,
    #[serde(default)]
    pub student_ids: Vec<String>,
}

impl SchoolState {
    /// Creates a group, or replaces the named one when `group_id` is given.
    /// Members must be enrolled; repeats are dropped.
    pub fn save_group(
        &mut self,
        admin_id: &str,
        group_id: Option<&str>,
        draft: &GroupDraft,
    ) -> Result<&StudentGroup, SchoolError> {
        self.authorized(admin_id, AdminPermission::StudentDirectory)?;
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(SchoolError::InvalidGroup);
        }

        let mut members: Vec<String> = Vec::with_capacity(draft.student_ids.len());
        for id in &draft.student_ids {
            self.student(id)?;
            if !members.contains(id) {
                members.push(id.clone());
            }
        }

        let group = StudentGroup {
            id: group_id.map_or_else(|| record_id("grp"), str::to_string),
            name: name.to_string(),
            kind: draft.kind,
            student_ids: members,
        };

        match group_id {
            Some(id) => {
                let index = self
                    .groups
                    .iter()
                    .position(|existing| existing.id == id)
                    .ok_or(SchoolError::GroupNotFound)?;
                self.groups[index] = group;
                Ok(&self.groups[index])
            }
            None => {
                self.groups.push(group);
                self.groups.last().ok_or(SchoolError::GroupNotFound)
            }
        }
    }

    pub fn delete_group(&mut self, admin_id: &str, group_id: &str) -> Result<(), SchoolError> {
        self.authorized(admin_id, AdminPermission::StudentDirectory)?;
        self.group(group_id)?;
        self.groups.retain(|group| group.id != group_id);
        Ok(())
    }
}

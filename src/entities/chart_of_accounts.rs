use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// A node of the income-statement account hierarchy.
///
/// Nodes form a tree through `parent_id`; roots have no parent and sit at
/// level 1.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chart_of_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Dotted account code, e.g. "3.1.02"
    pub code: String,

    pub name: String,

    pub parent_id: Option<i32>,

    pub level: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            level: Set(1),
            ..ActiveModelTrait::default()
        }
    }
}

impl Model {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Returns true when making `parent_id` the parent of `node_id` would close
/// a cycle. `nodes` must contain the whole tree.
pub fn would_create_cycle(nodes: &[Model], node_id: i32, parent_id: i32) -> bool {
    let mut cursor = Some(parent_id);
    let mut hops = 0usize;

    while let Some(current) = cursor {
        if current == node_id {
            return true;
        }
        // a pre-existing cycle that does not involve `node_id`
        if hops > nodes.len() {
            return true;
        }
        hops += 1;
        cursor = nodes
            .iter()
            .find(|node| node.id == current)
            .and_then(|node| node.parent_id);
    }

    false
}

//! 实体基础 trait

/// 实体 trait
pub trait Entity {
    type Id;

    fn id(&self) -> &Self::Id;
}

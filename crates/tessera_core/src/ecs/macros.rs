//! Convenience macros for entity spawning

/// Create an entity and attach every listed component to it.
///
/// # Examples
///
/// ```ignore
/// let crate_box = spawn!(world,
///     Transform::from_position(Vec3::new(0.0, 0.0, -5.0)),
///     BoxCollider::solid(Vec3::ONE),
/// );
/// ```
#[macro_export]
macro_rules! spawn {
    ($world:expr $(, $component:expr)+ $(,)?) => {{
        let entity = $world.create_entity();
        $(
            $world.add_component(entity, $component);
        )+
        entity
    }};
}

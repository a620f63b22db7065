use slate_common::{ObjectId, Transform};
use slate_ecs::ComponentStore;

/// What a script callback may touch.
pub struct ScriptContext<'a> {
    pub object: ObjectId,
    pub components: &'a mut ComponentStore,
    /// Seconds since the previous update; zero outside `update`/`late_update`.
    pub delta: f32,
}

impl ScriptContext<'_> {
    /// The object's transform, identity if it has none.
    pub fn transform(&self) -> Transform {
        self.components
            .get_transform(self.object)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.components.set_transform(self.object, transform);
    }
}

/// Per-object behaviour driven by the scene. Every callback is optional.
///
/// `awake` and `on_enable` run in the scene's awake pass, then `start`.
/// Each frame runs `update` on every enabled object, then `late_update`.
pub trait Script {
    fn awake(&mut self, _ctx: &mut ScriptContext<'_>) {}
    fn start(&mut self, _ctx: &mut ScriptContext<'_>) {}
    fn update(&mut self, _ctx: &mut ScriptContext<'_>) {}
    fn late_update(&mut self, _ctx: &mut ScriptContext<'_>) {}
    fn on_enable(&mut self, _ctx: &mut ScriptContext<'_>) {}
}

/// Spins its object around the Y axis at a fixed rate.
#[derive(Debug, Clone, Copy)]
pub struct Spin {
    /// Radians per second.
    pub speed: f32,
}

impl Script for Spin {
    fn update(&mut self, ctx: &mut ScriptContext<'_>) {
        let mut t = ctx.transform();
        t.rotation = glam::Quat::from_rotation_y(self.speed * ctx.delta) * t.rotation;
        ctx.set_transform(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spin_rotates_by_speed_times_delta() {
        let mut components = ComponentStore::new();
        let id = ObjectId::new();
        components.set_transform(id, Transform::default());
        let mut ctx = ScriptContext {
            object: id,
            components: &mut components,
            delta: 0.5,
        };
        let mut spin = Spin { speed: 2.0 };
        spin.update(&mut ctx);

        let rotation = components.get_transform(id).unwrap().rotation;
        let expected = glam::Quat::from_rotation_y(1.0);
        assert!(rotation.abs_diff_eq(expected, 1e-6));
    }
}

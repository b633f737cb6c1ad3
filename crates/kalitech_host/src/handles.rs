/// A numeric handle crossing the script boundary (§6 "Handles"). Every
/// handle type exposes `id()` so a dynamic-language host can coerce it to
/// an integer argument explicitly, instead of relying on arithmetic
/// coercion of the wrapper itself.
pub trait Handle {
    fn id(&self) -> u32;
    fn kind(&self) -> &'static str;
}

macro_rules! numeric_handle {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);

        impl Handle for $name {
            fn id(&self) -> u32 {
                self.0
            }

            fn kind(&self) -> &'static str {
                $kind
            }
        }
    };
}

numeric_handle!(MaterialHandle, "material");
numeric_handle!(BodyHandle, "body");
numeric_handle!(LightHandle, "light");
numeric_handle!(HudHandle, "hud");

impl Handle for kalitech_ecs::SurfaceHandle {
    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> &'static str {
        match self.kind {
            kalitech_ecs::SurfaceKind::Mesh => "mesh",
            kalitech_ecs::SurfaceKind::Terrain => "terrain",
            kalitech_ecs::SurfaceKind::EditorGrid => "editor_grid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_exposes_numeric_id_and_kind() {
        let handle = MaterialHandle(7);
        assert_eq!(handle.id(), 7);
        assert_eq!(handle.kind(), "material");
    }
}

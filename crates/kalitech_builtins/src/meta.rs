/// Static description of a builtin (§4.M), independent of whether it has
/// ever been required.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinMeta {
    pub name: &'static str,
    pub global_name: Option<&'static str>,
    pub version: &'static str,
    pub description: &'static str,
    pub engine_min: &'static str,
}

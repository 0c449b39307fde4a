// mod.rs - External aligner module root

pub mod command;
pub mod registry;
pub mod traits;

pub use command::CommandAligner;
pub use registry::AlignerRegistry;
pub use traits::ExternalAligner;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_builtin_aligners_registered() {
        let registry = AlignerRegistry::default();
        assert_eq!(registry.names(), vec!["clustalo", "mafft", "muscle"]);
        assert!(registry.has("mafft"));
        assert!(!registry.has("tcoffee"));
        assert_eq!(registry.get("muscle").unwrap().name(), "muscle");
    }

    #[test]
    fn test_list_is_sorted_with_descriptions() {
        let registry = AlignerRegistry::new();
        let listed = registry.list();
        assert_eq!(listed[0].0, "clustalo");
        assert_eq!(listed[0].1, "Clustal Omega");
    }

    #[test]
    fn test_resolve_custom_binary() {
        let mut registry = AlignerRegistry::new();
        let custom = registry.resolve("my-tool", Some(PathBuf::from("/opt/bin/my-tool"))).unwrap();
        assert_eq!(custom.name(), "my-tool");

        let mafft = registry.resolve("mafft", Some(PathBuf::from("/opt/mafft/bin/mafft"))).unwrap();
        assert_eq!(mafft.name(), "mafft");

        assert!(registry.resolve("unknown", None).is_none());
        assert!(registry.resolve("clustalo", None).is_some());
        assert!(!registry.has("clustalo"));
    }
}

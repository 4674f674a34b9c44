//! Configuration access port trait.

pub trait ConfigPort {
    /// Section names, in a stable order.
    fn sections(&self) -> Vec<String>;
    /// Key names of `section`, in a stable order. Empty for a missing section.
    fn keys(&self, section: &str) -> Vec<String>;
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}

use super::macros::impl_ops;

impl_ops!(Pa, u64, "Guest Physical Address");
impl_ops!(Va, u64, "Guest Linear Address");

impl Va {
    /// Checks if the linear address is NULL.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

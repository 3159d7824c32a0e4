/// Implements an arithmetic operator on a single-field newtype by delegating to a method of the inner value.
///
/// ```rust,ignore
/// op!(binary MinorUnits, Add, add => saturating_add);
/// op!(inplace MinorUnits, SubAssign, sub_assign => saturating_sub);
/// ```
#[macro_export]
macro_rules! op {
    (binary $newtype:ident, $op_trait:ident, $op_fn:ident => $inner_fn:ident) => {
        impl $op_trait for $newtype {
            type Output = Self;

            fn $op_fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$inner_fn(rhs.0))
            }
        }
    };

    (inplace $newtype:ident, $op_trait:ident, $op_fn:ident => $inner_fn:ident) => {
        impl $op_trait for $newtype {
            fn $op_fn(&mut self, rhs: Self) {
                self.0 = self.0.$inner_fn(rhs.0)
            }
        }
    };
}

pub mod compare;
pub mod diff;
pub mod key;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum DiffError {
        #[error("tolerance must be a positive finite number, got {0}")]
        InvalidTolerance(f64),
    }
}

pub mod tolerance {
    use crate::errors::DiffError;

    /// 推荐的默认公差，与既有图面比较流程保持一致。
    pub const DEFAULT_TOLERANCE: f64 = 1e-6;

    /// 经过校验的浮点公差 ε。推荐范围 1e-10 ..= 1e-2（仅文档约定，不强制）。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Tolerance(f64);

    impl Tolerance {
        /// 校验并包装公差值，非正数或非有限值被拒绝。
        pub fn new(value: f64) -> Result<Self, DiffError> {
            if !value.is_finite() || value <= 0.0 {
                return Err(DiffError::InvalidTolerance(value));
            }
            Ok(Self(value))
        }

        #[inline]
        pub fn get(self) -> f64 {
            self.0
        }
    }

    impl Default for Tolerance {
        fn default() -> Self {
            Self(DEFAULT_TOLERANCE)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::errors::DiffError;

        #[test]
        fn accepts_positive_finite_values() {
            assert!((Tolerance::new(1e-6).unwrap().get() - 1e-6).abs() < f64::EPSILON);
            assert!(Tolerance::new(0.01).is_ok());
        }

        #[test]
        fn rejects_zero_negative_and_non_finite() {
            for value in [0.0, -1e-6, f64::NAN, f64::INFINITY] {
                let err = Tolerance::new(value).unwrap_err();
                assert!(matches!(err, DiffError::InvalidTolerance(_)));
            }
        }
    }
}

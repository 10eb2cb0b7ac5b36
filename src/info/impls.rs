//! [`FieldValue`] implementations for the built-in scalars and `Option`.

use super::{FieldShape, FieldValue};
use crate::convert::FromText;
use crate::decode::DecodeError;
use crate::merge::MergeError;
use crate::tree::Element;

macro_rules! impl_scalar_field_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FieldValue for $ty {
            const SHAPE: FieldShape = FieldShape::Scalar;

            fn decode_element(element: &Element) -> Result<Self, DecodeError> {
                <$ty as FromText>::from_text(element.text().trim())
                    .map_err(|err| DecodeError::conversion(element, err))
            }
        }
    )*};
}

impl_scalar_field_value! {
    bool, char,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
    String,
}

impl<F: FieldValue> FieldValue for Option<F> {
    const SHAPE: FieldShape = F::SHAPE;

    #[inline]
    fn decode_element(element: &Element) -> Result<Self, DecodeError> {
        F::decode_element(element).map(Some)
    }

    #[inline]
    fn is_absent(&self) -> bool {
        self.is_none()
    }

    fn merge_nested(&mut self, other: &Self) -> Result<(), MergeError> {
        if let (Some(first), Some(second)) = (self.as_mut(), other.as_ref()) {
            first.merge_nested(second)?;
        }
        Ok(())
    }
}

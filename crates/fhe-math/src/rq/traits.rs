//! Traits associated with polynomials.

use super::{Context, Poly};
use crate::{Error, Result};
use itertools::izip;
use ndarray::Array2;
use std::sync::Arc;

/// Conversions to create polynomials.
///
/// We unfortunately cannot use the `TryFrom` trait from std::convert because
/// we need to specify additional parameters.
pub trait TryConvertFrom<T>
where
    Self: Sized,
{
    /// Attempt to convert the `value` into a polynomial with a specific
    /// context.
    fn try_convert_from(value: T, ctx: &Arc<Context>) -> Result<Self>;
}

impl TryConvertFrom<&[i64]> for Poly {
    fn try_convert_from(v: &[i64], ctx: &Arc<Context>) -> Result<Self> {
        if v.len() != ctx.degree {
            return Err(Error::Default(format!(
                "Expected {} coefficients, found {}",
                ctx.degree,
                v.len()
            )));
        }
        let mut p = Poly::zero(ctx);
        izip!(p.coefficients.outer_iter_mut(), ctx.q.iter()).for_each(|(mut row, qi)| {
            izip!(row.iter_mut(), v.iter()).for_each(|(r, vi)| *r = qi.reduce_i64(*vi))
        });
        Ok(p)
    }
}

impl TryConvertFrom<Array2<u64>> for Poly {
    fn try_convert_from(a: Array2<u64>, ctx: &Arc<Context>) -> Result<Self> {
        if a.shape() != [ctx.q.len(), ctx.degree] {
            return Err(Error::Default(
                "The array of coefficient does not have the correct shape".to_string(),
            ));
        }
        for (row, qi) in izip!(a.outer_iter(), ctx.q.iter()) {
            if row.iter().any(|c| *c >= qi.modulus()) {
                return Err(Error::Default(format!(
                    "Coefficient not reduced modulo {}",
                    qi.modulus()
                )));
            }
        }
        Ok(Poly {
            ctx: ctx.clone(),
            coefficients: a,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::TryConvertFrom;
    use crate::rq::{Context, Poly};
    use ndarray::Array2;
    use std::{error::Error, sync::Arc};

    #[test]
    fn from_array() -> Result<(), Box<dyn Error>> {
        let ctx = Arc::new(Context::new(&[1153, 4611686018326724609], 8)?);

        let a = Array2::from_shape_fn((2, 8), |(i, j)| (i * 8 + j) as u64);
        let p = Poly::try_convert_from(a.clone(), &ctx)?;
        assert_eq!(p.coefficients(), a.view());

        assert!(Poly::try_convert_from(Array2::<u64>::zeros((1, 8)), &ctx).is_err());
        assert!(Poly::try_convert_from(Array2::<u64>::zeros((2, 16)), &ctx).is_err());
        assert!(Poly::try_convert_from(Array2::from_elem((2, 8), 1153u64), &ctx).is_err());
        Ok(())
    }
}

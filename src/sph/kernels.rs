use crate::Scalar;
use std::f64::consts::PI;

/// The smoothing kernels used by the SPH solver, along with their normalization coefficients.
///
/// Every coefficient depends on the smoothing radius `h`, so they are only ever computed
/// together in `Kernels::new`. Changing `h` means replacing the whole struct.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kernels {
    /// The smoothing radius
    pub h: Scalar,
    /// `h * h`, particles further apart than this (squared) don't interact
    pub hsq: Scalar,
    pub poly6: Scalar,
    pub spiky_grad: Scalar,
    pub visc_lap: Scalar,
}

impl Kernels {
    pub fn new(h: Scalar) -> Self {
        Kernels {
            h,
            hsq: h * h,
            poly6: 315. / (64. * PI * h.powi(9)),
            spiky_grad: -45. / (PI * h.powi(6)),
            visc_lap: 45. / (PI * h.powi(5)),
        }
    }

    /// The density weight for two particles whose squared distance is `r2`.
    pub fn poly6(&self, r2: Scalar) -> Scalar {
        let temp = Scalar::max(0., self.hsq - r2);
        self.poly6 * temp * temp * temp
    }

    /// Magnitude of the spiky kernel gradient, divided by `r`, so it can be multiplied directly
    /// with the (unnormalized) separation vector. `r` must be strictly positive.
    pub fn spiky_grad(&self, r: Scalar) -> Scalar {
        let temp = Scalar::max(0., self.h - r);
        self.spiky_grad * temp * temp / r
    }

    pub fn visc_laplacian(&self, r: Scalar) -> Scalar {
        self.visc_lap * (1. - r / self.h)
    }

    /// The density a particle gets from itself alone.
    pub fn self_density(&self, mass: Scalar) -> Scalar {
        mass * self.poly6(0.)
    }
}

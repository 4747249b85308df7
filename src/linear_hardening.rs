use crate::elastic::elastic_tangent;
use crate::error::Result;
use crate::interfaces::{check_non_negative, check_positive, MaterialPoint};
use crate::tensor::{ddot22s, dyadic22, hydrostatic_deviatoric, i2, i4d, Tensor2, Tensor4};

/// Von Mises plasticity with linear isotropic hardening, integrated with a radial
/// return.
///
/// The yield function is `φ = σ_eq - (σy0 + H ε_p)`. The state is double
/// buffered: fields suffixed `_t` hold the last committed step and are only
/// written by [`MaterialPoint::increment`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinearHardening {
    kappa: f64,
    mu: f64,
    sigy0: f64,
    h: f64,
    epsp: f64,
    epsp_t: f64,
    eps: Tensor2,
    eps_t: Tensor2,
    epse: Tensor2,
    epse_t: Tensor2,
    sig: Tensor2,
    tangent: Tensor4,
}

impl LinearHardening {
    /// `kappa`: bulk modulus, `mu`: shear modulus, `sigy0`: initial yield stress,
    /// `h`: hardening modulus.
    pub fn new(kappa: f64, mu: f64, sigy0: f64, h: f64) -> Result<Self> {
        let kappa = check_positive("kappa", kappa)?;
        let mu = check_positive("mu", mu)?;
        let sigy0 = check_non_negative("sigy0", sigy0)?;
        let h = check_non_negative("h", h)?;
        Ok(Self {
            kappa,
            mu,
            sigy0,
            h,
            epsp: 0.0,
            epsp_t: 0.0,
            eps: Tensor2::zeros(),
            eps_t: Tensor2::zeros(),
            epse: Tensor2::zeros(),
            epse_t: Tensor2::zeros(),
            sig: Tensor2::zeros(),
            tangent: elastic_tangent(kappa, mu),
        })
    }

    pub fn sigy0(&self) -> f64 {
        self.sigy0
    }

    pub fn hardening(&self) -> f64 {
        self.h
    }

    /// Current yield stress `σy0 + H ε_p`.
    pub fn sigy(&self) -> f64 {
        self.sigy0 + self.h * self.epsp
    }

    /// Equivalent plastic strain at the last commit.
    pub fn epsp_committed(&self) -> f64 {
        self.epsp_t
    }

    pub fn elastic_strain(&self) -> &Tensor2 {
        &self.epse
    }

    /// Sets the strain and returns the resulting stress. The history is not committed.
    pub fn compute_stress(&mut self, eps: &Tensor2) -> Tensor2 {
        self.set_strain(eps, false);
        self.sig
    }

    /// Sets the strain and returns the resulting stress and consistent tangent.
    /// The history is not committed.
    pub fn compute_tangent(&mut self, eps: &Tensor2) -> (Tensor2, Tensor4) {
        self.set_strain(eps, true);
        (self.sig, self.tangent)
    }
}

impl MaterialPoint for LinearHardening {
    fn kappa(&self) -> f64 {
        self.kappa
    }

    fn mu(&self) -> f64 {
        self.mu
    }

    fn set_strain(&mut self, eps: &Tensor2, compute_tangent: bool) {
        let (kappa, mu, h) = (self.kappa, self.mu, self.h);
        self.eps = *eps;

        // trial state: the whole increment is elastic
        let epse_tr = self.epse_t + (self.eps - self.eps_t);
        let (epsem, epsed_tr) = hydrostatic_deviatoric(&epse_tr);

        let sigm = 3.0 * kappa * epsem;
        let sigd_tr = 2.0 * mu * epsed_tr;
        let sigeq_tr = (1.5 * ddot22s(&sigd_tr, &sigd_tr)).sqrt();

        let phi = sigeq_tr - (self.sigy0 + h * self.epsp_t);

        if compute_tangent {
            self.tangent = elastic_tangent(kappa, mu);
        }

        if phi <= 0.0 {
            self.epse = epse_tr;
            self.epsp = self.epsp_t;
            self.sig = sigm * i2() + sigd_tr;
            return;
        }

        // φ > 0 implies σ_eq > σy0 + H ε_p,t >= 0, the divisions below are safe
        let dgamma = phi / (3.0 * mu + h);
        let n = 1.5 * sigd_tr / sigeq_tr;
        let sigd = (1.0 - 3.0 * mu * dgamma / sigeq_tr) * sigd_tr;

        self.epse = epsem * i2() + sigd / (2.0 * mu);
        self.epsp = self.epsp_t + dgamma;
        self.sig = sigm * i2() + sigd;

        if compute_tangent {
            self.tangent -= 6.0 * mu.powi(2) * dgamma / sigeq_tr * *i4d();
            self.tangent +=
                4.0 * mu.powi(2) * (dgamma / sigeq_tr - 1.0 / (3.0 * mu + h)) * dyadic22(&n, &n);
        }
    }

    fn strain(&self) -> &Tensor2 {
        &self.eps
    }

    fn stress(&self) -> &Tensor2 {
        &self.sig
    }

    fn tangent(&self) -> &Tensor4 {
        &self.tangent
    }

    fn epsp(&self) -> f64 {
        self.epsp
    }

    fn increment(&mut self) {
        self.epsp_t = self.epsp;
        self.epse_t = self.epse;
        self.eps_t = self.eps;
    }
}

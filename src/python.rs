use crate::tensor::{self, Tensor2, Tensor4};
use crate::{Array, Elastic, LinearHardening, MaterialError, MaterialPoint};
use nalgebra::{Const, Dyn};
use numpy::ndarray::{Array2, Array4, ArrayD};
use numpy::{IntoPyArray, PyArray2, PyArray4, PyArrayDyn, PyReadonlyArray2, PyReadonlyArrayDyn};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

impl From<MaterialError> for PyErr {
    fn from(err: MaterialError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn to_tensor2(a: &PyReadonlyArray2<f64>) -> PyResult<Tensor2> {
    a.try_as_matrix::<Const<3>, Const<3>, Dyn, Dyn>()
        .map(|m| m.clone_owned())
        .ok_or_else(|| PyValueError::new_err("expected an array of shape (3, 3)"))
}

fn from_tensor2<'py>(py: Python<'py>, a: &Tensor2) -> &'py PyArray2<f64> {
    Array2::from_shape_fn((3, 3), |(i, j)| a[(i, j)]).into_pyarray(py)
}

fn from_tensor4<'py>(py: Python<'py>, c: &Tensor4) -> &'py PyArray4<f64> {
    Array4::from_shape_fn((3, 3, 3, 3), |(i, j, k, l)| c[(3 * i + j, 3 * k + l)]).into_pyarray(py)
}

/// NumPy integer arrays arrive as `i64`; negative entries become invalid indices.
fn to_indices(a: &PyReadonlyArrayDyn<i64>) -> ArrayD<usize> {
    a.as_array()
        .mapv(|v| usize::try_from(v).unwrap_or(usize::MAX))
}

fn to_codes<'py>(py: Python<'py>, a: ArrayD<usize>) -> &'py PyArrayDyn<u64> {
    a.mapv(|v| v as u64).into_pyarray(py)
}

#[pyclass(name = "Elastic")]
#[derive(Clone)]
struct PyElastic {
    model: Elastic,
}

#[pymethods]
impl PyElastic {
    #[new]
    fn new(kappa: f64, mu: f64) -> PyResult<Self> {
        Ok(Self {
            model: Elastic::new(kappa, mu)?,
        })
    }

    #[getter]
    fn kappa(&self) -> f64 {
        self.model.kappa()
    }

    #[getter]
    fn mu(&self) -> f64 {
        self.model.mu()
    }

    #[pyo3(signature = (eps, compute_tangent = true))]
    fn set_strain(&mut self, eps: PyReadonlyArray2<f64>, compute_tangent: bool) -> PyResult<()> {
        self.model.set_strain(&to_tensor2(&eps)?, compute_tangent);
        Ok(())
    }

    fn strain<'py>(&self, py: Python<'py>) -> &'py PyArray2<f64> {
        from_tensor2(py, self.model.strain())
    }

    fn stress<'py>(&self, py: Python<'py>) -> &'py PyArray2<f64> {
        from_tensor2(py, self.model.stress())
    }

    fn tangent<'py>(&self, py: Python<'py>) -> &'py PyArray4<f64> {
        from_tensor4(py, self.model.tangent())
    }

    fn epsp(&self) -> f64 {
        self.model.epsp()
    }

    fn increment(&mut self) {
        self.model.increment()
    }

    fn __repr__(&self) -> String {
        format!("<Elastic kappa={} mu={}>", self.model.kappa(), self.model.mu())
    }
}

#[pyclass(name = "LinearHardening")]
#[derive(Clone)]
struct PyLinearHardening {
    model: LinearHardening,
}

#[pymethods]
impl PyLinearHardening {
    #[new]
    fn new(kappa: f64, mu: f64, sigy0: f64, h: f64) -> PyResult<Self> {
        Ok(Self {
            model: LinearHardening::new(kappa, mu, sigy0, h)?,
        })
    }

    #[getter]
    fn kappa(&self) -> f64 {
        self.model.kappa()
    }

    #[getter]
    fn mu(&self) -> f64 {
        self.model.mu()
    }

    #[getter]
    fn sigy0(&self) -> f64 {
        self.model.sigy0()
    }

    #[getter]
    fn h(&self) -> f64 {
        self.model.hardening()
    }

    #[pyo3(signature = (eps, compute_tangent = true))]
    fn set_strain(&mut self, eps: PyReadonlyArray2<f64>, compute_tangent: bool) -> PyResult<()> {
        self.model.set_strain(&to_tensor2(&eps)?, compute_tangent);
        Ok(())
    }

    fn strain<'py>(&self, py: Python<'py>) -> &'py PyArray2<f64> {
        from_tensor2(py, self.model.strain())
    }

    fn stress<'py>(&self, py: Python<'py>) -> &'py PyArray2<f64> {
        from_tensor2(py, self.model.stress())
    }

    fn tangent<'py>(&self, py: Python<'py>) -> &'py PyArray4<f64> {
        from_tensor4(py, self.model.tangent())
    }

    fn epsp(&self) -> f64 {
        self.model.epsp()
    }

    fn increment(&mut self) {
        self.model.increment()
    }

    fn __repr__(&self) -> String {
        format!(
            "<LinearHardening kappa={} mu={} sigy0={} h={}>",
            self.model.kappa(),
            self.model.mu(),
            self.model.sigy0(),
            self.model.hardening()
        )
    }
}

#[pyclass(name = "Array")]
struct PyMaterialArray {
    array: Array,
}

#[pymethods]
impl PyMaterialArray {
    #[new]
    fn new(shape: Vec<usize>) -> Self {
        Self {
            array: Array::new(&shape),
        }
    }

    #[getter]
    fn shape(&self) -> Vec<usize> {
        self.array.shape().to_vec()
    }

    fn set_elastic(&mut self, mask: PyReadonlyArrayDyn<i64>, kappa: f64, mu: f64) -> PyResult<()> {
        Ok(self.array.set_elastic(&to_indices(&mask), kappa, mu)?)
    }

    fn set_elastic_indexed(
        &mut self,
        mask: PyReadonlyArrayDyn<i64>,
        idx: PyReadonlyArrayDyn<i64>,
        kappa: Vec<f64>,
        mu: Vec<f64>,
    ) -> PyResult<()> {
        Ok(self
            .array
            .set_elastic_indexed(&to_indices(&mask), &to_indices(&idx), &kappa, &mu)?)
    }

    fn set_linear_hardening(
        &mut self,
        mask: PyReadonlyArrayDyn<i64>,
        kappa: f64,
        mu: f64,
        sigy0: f64,
        h: f64,
    ) -> PyResult<()> {
        Ok(self
            .array
            .set_linear_hardening(&to_indices(&mask), kappa, mu, sigy0, h)?)
    }

    fn set_linear_hardening_indexed(
        &mut self,
        mask: PyReadonlyArrayDyn<i64>,
        idx: PyReadonlyArrayDyn<i64>,
        kappa: Vec<f64>,
        mu: Vec<f64>,
        sigy0: Vec<f64>,
        h: Vec<f64>,
    ) -> PyResult<()> {
        Ok(self.array.set_linear_hardening_indexed(
            &to_indices(&mask),
            &to_indices(&idx),
            &kappa,
            &mu,
            &sigy0,
            &h,
        )?)
    }

    #[pyo3(signature = (eps, compute_tangent = true))]
    fn set_strain(&mut self, eps: PyReadonlyArrayDyn<f64>, compute_tangent: bool) -> PyResult<()> {
        Ok(self.array.set_strain(&eps.as_array(), compute_tangent)?)
    }

    fn strain<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.strain().into_pyarray(py)
    }

    fn stress<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.stress().into_pyarray(py)
    }

    fn tangent<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.tangent().into_pyarray(py)
    }

    fn epsp<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.epsp().into_pyarray(py)
    }

    fn kappa<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.kappa().into_pyarray(py)
    }

    fn mu<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.mu().into_pyarray(py)
    }

    fn r#type<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<u64> {
        to_codes(py, self.array.type_ids())
    }

    fn is_elastic<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<u64> {
        to_codes(py, self.array.is_elastic())
    }

    fn is_plastic<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<u64> {
        to_codes(py, self.array.is_plastic())
    }

    fn is_linear_hardening<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<u64> {
        to_codes(py, self.array.is_linear_hardening())
    }

    #[allow(non_snake_case)]
    fn I2<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.i2().into_pyarray(py)
    }

    #[allow(non_snake_case)]
    fn II<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.ii().into_pyarray(py)
    }

    #[allow(non_snake_case)]
    fn I4<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.i4().into_pyarray(py)
    }

    #[allow(non_snake_case)]
    fn I4rt<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.i4rt().into_pyarray(py)
    }

    #[allow(non_snake_case)]
    fn I4s<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.i4s().into_pyarray(py)
    }

    #[allow(non_snake_case)]
    fn I4d<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.array.i4d().into_pyarray(py)
    }

    fn increment(&mut self) {
        self.array.increment()
    }

    fn check(&self) -> PyResult<()> {
        Ok(self.array.check()?)
    }

    fn get_elastic(&self, index: Vec<usize>) -> PyResult<PyElastic> {
        Ok(PyElastic {
            model: self.array.elastic(&index)?.clone(),
        })
    }

    fn get_linear_hardening(&self, index: Vec<usize>) -> PyResult<PyLinearHardening> {
        Ok(PyLinearHardening {
            model: self.array.linear_hardening(&index)?.clone(),
        })
    }

    fn __repr__(&self) -> String {
        format!("<Array shape={:?}>", self.array.shape())
    }
}

#[pyfunction]
#[pyo3(name = "Sigeq")]
fn sigeq<'py>(py: Python<'py>, a: PyReadonlyArrayDyn<f64>) -> PyResult<&'py PyArrayDyn<f64>> {
    Ok(tensor::sigeq_array(&a.as_array())?.into_pyarray(py))
}

#[pyfunction]
#[pyo3(name = "Epseq")]
fn epseq<'py>(py: Python<'py>, a: PyReadonlyArrayDyn<f64>) -> PyResult<&'py PyArrayDyn<f64>> {
    Ok(tensor::epseq_array(&a.as_array())?.into_pyarray(py))
}

#[pyfunction]
#[pyo3(name = "Hydrostatic")]
fn hydrostatic<'py>(py: Python<'py>, a: PyReadonlyArrayDyn<f64>) -> PyResult<&'py PyArrayDyn<f64>> {
    Ok(tensor::hydrostatic_array(&a.as_array())?.into_pyarray(py))
}

#[pyfunction]
#[pyo3(name = "Deviatoric")]
fn deviatoric<'py>(py: Python<'py>, a: PyReadonlyArrayDyn<f64>) -> PyResult<&'py PyArrayDyn<f64>> {
    Ok(tensor::deviatoric_array(&a.as_array())?.into_pyarray(py))
}

#[pyfunction]
fn version() -> &'static str {
    crate::version()
}

/// Elasto-plastic material points for Python.
#[pymodule]
fn elastoplastic(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyElastic>()?;
    m.add_class::<PyLinearHardening>()?;
    m.add_class::<PyMaterialArray>()?;
    m.add_function(wrap_pyfunction!(sigeq, m)?)?;
    m.add_function(wrap_pyfunction!(epseq, m)?)?;
    m.add_function(wrap_pyfunction!(hydrostatic, m)?)?;
    m.add_function(wrap_pyfunction!(deviatoric, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    Ok(())
}

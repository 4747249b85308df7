//! Collections of material points sharing one index space.
//!
//! Every point is tagged with a [`Type`] and, once assigned, refers to one entry in
//! the store of that type. Assignment is done once per point; afterwards the strain
//! of all points is set in one call and the response is gathered into arrays shaped
//! like the index space followed by the tensor dimensions.
use crate::elastic::Elastic;
use crate::error::{MaterialError, Result};
use crate::interfaces::MaterialPoint;
use crate::linear_hardening::LinearHardening;
use crate::tensor::{self, append_shape, Tensor2, Tensor4};
use ndarray::{ArrayBase, ArrayD, Data, DataMut, Dimension, IxDyn};
use rayon::prelude::*;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, FromRepr};

const TENSOR2: [usize; 2] = [3, 3];
const TENSOR4: [usize; 4] = [3, 3, 3, 3];
const SCALAR: [usize; 0] = [];

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    FromRepr,
    AsRefStr,
)]
#[repr(usize)]
pub enum Type {
    #[default]
    Unset = 0,
    Elastic = 1,
    LinearHardening = 2,
}

#[derive(Debug, Clone)]
pub struct Array {
    shape: Vec<usize>,
    types: Vec<Type>,
    /// Position of each point in the store of its type.
    index: Vec<usize>,
    elastic: Vec<Elastic>,
    /// Flat point index owning each entry of `elastic`.
    elastic_points: Vec<usize>,
    linear_hardening: Vec<LinearHardening>,
    linear_hardening_points: Vec<usize>,
    min_len: usize,
}

impl Array {
    /// Allocates `shape` points, all [`Type::Unset`].
    pub fn new(shape: &[usize]) -> Self {
        let size = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            types: vec![Type::Unset; size],
            index: vec![0; size],
            elastic: Vec::new(),
            elastic_points: Vec::new(),
            linear_hardening: Vec::new(),
            linear_hardening_points: Vec::new(),
            min_len: 64,
        }
    }

    /// Points organised as `[nelem, nip]` (elements x integration points).
    pub fn matrix(nelem: usize, nip: usize) -> Self {
        Self::new(&[nelem, nip])
    }

    /// Minimum number of points handled by one parallel work item.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len.max(1);
        self
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.types.len()
    }

    pub fn nelem(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    pub fn nip(&self) -> usize {
        self.shape.get(1).copied().unwrap_or(1)
    }

    fn to_array<T: Clone>(&self, fill: T, data: impl Iterator<Item = T>) -> ArrayD<T> {
        let mut out = ArrayD::from_elem(IxDyn(&self.shape), fill);
        for (o, v) in out.iter_mut().zip(data) {
            *o = v;
        }
        out
    }

    fn mask_of(&self, f: impl Fn(Type) -> bool) -> ArrayD<usize> {
        self.to_array(0, self.types.iter().map(|&t| usize::from(f(t))))
    }

    pub fn types(&self) -> ArrayD<Type> {
        self.to_array(Type::Unset, self.types.iter().copied())
    }

    pub fn type_ids(&self) -> ArrayD<usize> {
        self.to_array(0, self.types.iter().map(|&t| t as usize))
    }

    pub fn is_elastic(&self) -> ArrayD<usize> {
        self.mask_of(|t| t == Type::Elastic)
    }

    /// Every point that is not [`Type::Elastic`], unset points included.
    pub fn is_plastic(&self) -> ArrayD<usize> {
        self.mask_of(|t| t != Type::Elastic)
    }

    pub fn is_linear_hardening(&self) -> ArrayD<usize> {
        self.mask_of(|t| t == Type::LinearHardening)
    }

    pub fn unset_count(&self) -> usize {
        self.types.iter().filter(|&&t| t == Type::Unset).count()
    }

    pub fn is_complete(&self) -> bool {
        self.unset_count() == 0
    }

    /// Fails if any point has no material assigned.
    pub fn check(&self) -> Result<()> {
        match self.unset_count() {
            0 => Ok(()),
            count => {
                tracing::debug!(count, "incomplete material assignment");
                Err(MaterialError::Unset { count })
            }
        }
    }

    pub fn i2(&self) -> ArrayD<f64> {
        let mut flat = [0.0; 9];
        tensor::write_row_slice(&tensor::i2(), &mut flat);
        tensor::broadcast(&self.shape, &TENSOR2, &flat)
    }

    fn broadcast4(&self, c: &Tensor4) -> ArrayD<f64> {
        let mut flat = [0.0; 81];
        tensor::write_row_slice4(c, &mut flat);
        tensor::broadcast(&self.shape, &TENSOR4, &flat)
    }

    pub fn ii(&self) -> ArrayD<f64> {
        self.broadcast4(tensor::ii())
    }

    pub fn i4(&self) -> ArrayD<f64> {
        self.broadcast4(tensor::i4())
    }

    pub fn i4rt(&self) -> ArrayD<f64> {
        self.broadcast4(tensor::i4rt())
    }

    pub fn i4s(&self) -> ArrayD<f64> {
        self.broadcast4(tensor::i4s())
    }

    pub fn i4d(&self) -> ArrayD<f64> {
        self.broadcast4(tensor::i4d())
    }

    fn unravel(&self, mut flat: usize) -> Vec<usize> {
        let mut index = vec![0; self.shape.len()];
        for (d, &n) in self.shape.iter().enumerate().rev() {
            index[d] = flat % n;
            flat /= n;
        }
        index
    }

    fn ravel(&self, index: &[usize]) -> Result<usize> {
        let out_of_bounds = || MaterialError::IndexOutOfBounds {
            index: index.to_vec(),
            shape: self.shape.clone(),
        };
        if index.len() != self.shape.len() {
            return Err(out_of_bounds());
        }
        index
            .iter()
            .zip(&self.shape)
            .try_fold(0, |acc, (&i, &n)| if i < n { Ok(acc * n + i) } else { Err(out_of_bounds()) })
    }

    fn check_shape(&self, what: &'static str, found: &[usize], tail: &[usize]) -> Result<()> {
        let expected = append_shape(&self.shape, tail);
        if found == expected.as_slice() {
            Ok(())
        } else {
            Err(MaterialError::ShapeMismatch {
                what,
                expected,
                found: found.to_vec(),
            })
        }
    }

    /// Flat indices selected by `mask`, all of which must still be unset.
    fn selection<S, D>(&self, mask: &ArrayBase<S, D>) -> Result<Vec<usize>>
    where
        S: Data<Elem = usize>,
        D: Dimension,
    {
        self.check_shape("mask", mask.shape(), &SCALAR)?;
        let mut selected = Vec::new();
        for (i, &value) in mask.iter().enumerate() {
            match value {
                0 => {}
                1 if self.types[i] == Type::Unset => selected.push(i),
                1 => {
                    return Err(MaterialError::AlreadyAssigned {
                        index: self.unravel(i),
                    })
                }
                value => return Err(MaterialError::InvalidMask { value }),
            }
        }
        Ok(selected)
    }

    /// Parameter table row used by each selected point.
    fn table_rows<S, D>(
        &self,
        idx: &ArrayBase<S, D>,
        selected: &[usize],
        len: usize,
    ) -> Result<Vec<usize>>
    where
        S: Data<Elem = usize>,
        D: Dimension,
    {
        self.check_shape("idx", idx.shape(), &SCALAR)?;
        let idx: Vec<usize> = idx.iter().copied().collect();
        selected
            .iter()
            .map(|&i| match idx[i] {
                j if j < len => Ok(j),
                j => Err(MaterialError::ParameterIndex { index: j, len }),
            })
            .collect()
    }

    fn push_elastic(&mut self, selected: Vec<usize>, models: Vec<Elastic>) {
        for (i, model) in selected.into_iter().zip(models) {
            self.types[i] = Type::Elastic;
            self.index[i] = self.elastic.len();
            self.elastic.push(model);
            self.elastic_points.push(i);
        }
    }

    fn push_linear_hardening(&mut self, selected: Vec<usize>, models: Vec<LinearHardening>) {
        for (i, model) in selected.into_iter().zip(models) {
            self.types[i] = Type::LinearHardening;
            self.index[i] = self.linear_hardening.len();
            self.linear_hardening.push(model);
            self.linear_hardening_points.push(i);
        }
    }

    /// Assigns [`Elastic`] with the same parameters to every point where `mask == 1`.
    pub fn set_elastic<S, D>(&mut self, mask: &ArrayBase<S, D>, kappa: f64, mu: f64) -> Result<()>
    where
        S: Data<Elem = usize>,
        D: Dimension,
    {
        let selected = self.selection(mask)?;
        let model = Elastic::new(kappa, mu)?;
        tracing::debug!(points = selected.len(), kappa, mu, "assigning Elastic");
        let models = vec![model; selected.len()];
        self.push_elastic(selected, models);
        Ok(())
    }

    /// Assigns [`Elastic`] to every point where `mask == 1`, taking the parameters
    /// from row `idx` of the tables `kappa` and `mu`.
    pub fn set_elastic_indexed<S, T, D, E>(
        &mut self,
        mask: &ArrayBase<S, D>,
        idx: &ArrayBase<T, E>,
        kappa: &[f64],
        mu: &[f64],
    ) -> Result<()>
    where
        S: Data<Elem = usize>,
        T: Data<Elem = usize>,
        D: Dimension,
        E: Dimension,
    {
        check_table_len("mu", kappa.len(), mu.len())?;
        let selected = self.selection(mask)?;
        let rows = self.table_rows(idx, &selected, kappa.len())?;
        let models = rows
            .iter()
            .map(|&j| Elastic::new(kappa[j], mu[j]))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            points = selected.len(),
            table = kappa.len(),
            "assigning Elastic from parameter table"
        );
        self.push_elastic(selected, models);
        Ok(())
    }

    /// Assigns [`LinearHardening`] with the same parameters to every point where
    /// `mask == 1`.
    pub fn set_linear_hardening<S, D>(
        &mut self,
        mask: &ArrayBase<S, D>,
        kappa: f64,
        mu: f64,
        sigy0: f64,
        h: f64,
    ) -> Result<()>
    where
        S: Data<Elem = usize>,
        D: Dimension,
    {
        let selected = self.selection(mask)?;
        let model = LinearHardening::new(kappa, mu, sigy0, h)?;
        tracing::debug!(
            points = selected.len(),
            kappa,
            mu,
            sigy0,
            h,
            "assigning LinearHardening"
        );
        let models = vec![model; selected.len()];
        self.push_linear_hardening(selected, models);
        Ok(())
    }

    /// Assigns [`LinearHardening`] to every point where `mask == 1`, taking the
    /// parameters from row `idx` of the given tables.
    #[allow(clippy::too_many_arguments)]
    pub fn set_linear_hardening_indexed<S, T, D, E>(
        &mut self,
        mask: &ArrayBase<S, D>,
        idx: &ArrayBase<T, E>,
        kappa: &[f64],
        mu: &[f64],
        sigy0: &[f64],
        h: &[f64],
    ) -> Result<()>
    where
        S: Data<Elem = usize>,
        T: Data<Elem = usize>,
        D: Dimension,
        E: Dimension,
    {
        check_table_len("mu", kappa.len(), mu.len())?;
        check_table_len("sigy0", kappa.len(), sigy0.len())?;
        check_table_len("h", kappa.len(), h.len())?;
        let selected = self.selection(mask)?;
        let rows = self.table_rows(idx, &selected, kappa.len())?;
        let models = rows
            .iter()
            .map(|&j| LinearHardening::new(kappa[j], mu[j], sigy0[j], h[j]))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            points = selected.len(),
            table = kappa.len(),
            "assigning LinearHardening from parameter table"
        );
        self.push_linear_hardening(selected, models);
        Ok(())
    }

    /// Sets the strain of every assigned point and computes its stress (and tangent
    /// if requested). `eps` is shaped `[shape..., 3, 3]`; unset points are skipped.
    pub fn set_strain<S, D>(&mut self, eps: &ArrayBase<S, D>, compute_tangent: bool) -> Result<()>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.check_shape("strain", eps.shape(), &TENSOR2)?;
        let eps = eps.as_standard_layout();
        let values = eps.as_slice().ok_or(MaterialError::NonContiguous)?;
        let _span = tracing::trace_span!("set_strain", points = self.size(), compute_tangent).entered();

        let min_len = self.min_len;
        self.elastic
            .par_iter_mut()
            .zip(self.elastic_points.par_iter())
            .with_min_len(min_len)
            .for_each(|(model, &i)| model.set_strain(&point_strain(values, i), compute_tangent));
        self.linear_hardening
            .par_iter_mut()
            .zip(self.linear_hardening_points.par_iter())
            .with_min_len(min_len)
            .for_each(|(model, &i)| model.set_strain(&point_strain(values, i), compute_tangent));
        Ok(())
    }

    /// Commits the history of every point.
    pub fn increment(&mut self) {
        let _span = tracing::trace_span!("increment", points = self.size()).entered();
        self.linear_hardening
            .par_iter_mut()
            .with_min_len(self.min_len)
            .for_each(|model| model.increment());
    }

    /// Writes one chunk per point; unset points are written as zeros.
    fn fill(
        &self,
        values: &mut [f64],
        chunk_len: usize,
        write: impl Fn(&dyn MaterialPoint, &mut [f64]) + Sync,
    ) {
        values
            .par_chunks_mut(chunk_len)
            .with_min_len(self.min_len)
            .enumerate()
            .for_each(|(i, chunk)| match self.types[i] {
                Type::Unset => chunk.fill(0.0),
                Type::Elastic => write(&self.elastic[self.index[i]], chunk),
                Type::LinearHardening => write(&self.linear_hardening[self.index[i]], chunk),
            });
    }

    fn gather<S, D>(
        &self,
        what: &'static str,
        tail: &[usize],
        out: &mut ArrayBase<S, D>,
        write: impl Fn(&dyn MaterialPoint, &mut [f64]) + Sync,
    ) -> Result<()>
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        self.check_shape(what, out.shape(), tail)?;
        let values = out.as_slice_mut().ok_or(MaterialError::NonContiguous)?;
        self.fill(values, tail.iter().product(), write);
        Ok(())
    }

    fn collect(
        &self,
        tail: &[usize],
        write: impl Fn(&dyn MaterialPoint, &mut [f64]) + Sync,
    ) -> ArrayD<f64> {
        let mut out = ArrayD::zeros(IxDyn(&append_shape(&self.shape, tail)));
        // a fresh array is always in standard layout
        if let Some(values) = out.as_slice_mut() {
            self.fill(values, tail.iter().product(), write);
        }
        out
    }

    pub fn strain_into<S, D>(&self, out: &mut ArrayBase<S, D>) -> Result<()>
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        self.gather("strain", &TENSOR2, out, |p, chunk| p.write_strain(chunk))
    }

    pub fn stress_into<S, D>(&self, out: &mut ArrayBase<S, D>) -> Result<()>
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        self.gather("stress", &TENSOR2, out, |p, chunk| p.write_stress(chunk))
    }

    pub fn tangent_into<S, D>(&self, out: &mut ArrayBase<S, D>) -> Result<()>
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        self.gather("tangent", &TENSOR4, out, |p, chunk| p.write_tangent(chunk))
    }

    /// Current equivalent plastic strain, identically zero for elastic points.
    pub fn epsp_into<S, D>(&self, out: &mut ArrayBase<S, D>) -> Result<()>
    where
        S: DataMut<Elem = f64>,
        D: Dimension,
    {
        self.gather("epsp", &SCALAR, out, |p, chunk| chunk[0] = p.epsp())
    }

    pub fn strain(&self) -> ArrayD<f64> {
        self.collect(&TENSOR2, |p, chunk| p.write_strain(chunk))
    }

    pub fn stress(&self) -> ArrayD<f64> {
        self.collect(&TENSOR2, |p, chunk| p.write_stress(chunk))
    }

    pub fn tangent(&self) -> ArrayD<f64> {
        self.collect(&TENSOR4, |p, chunk| p.write_tangent(chunk))
    }

    pub fn epsp(&self) -> ArrayD<f64> {
        self.collect(&SCALAR, |p, chunk| chunk[0] = p.epsp())
    }

    /// Bulk modulus per point, zero where unset.
    pub fn kappa(&self) -> ArrayD<f64> {
        self.collect(&SCALAR, |p, chunk| chunk[0] = p.kappa())
    }

    /// Shear modulus per point, zero where unset.
    pub fn mu(&self) -> ArrayD<f64> {
        self.collect(&SCALAR, |p, chunk| chunk[0] = p.mu())
    }

    fn expect_type(&self, index: &[usize], expected: Type) -> Result<usize> {
        let i = self.ravel(index)?;
        match self.types[i] {
            found if found == expected => Ok(self.index[i]),
            found => Err(MaterialError::WrongType {
                index: index.to_vec(),
                expected,
                found,
            }),
        }
    }

    pub fn elastic(&self, index: &[usize]) -> Result<&Elastic> {
        let j = self.expect_type(index, Type::Elastic)?;
        Ok(&self.elastic[j])
    }

    pub fn elastic_mut(&mut self, index: &[usize]) -> Result<&mut Elastic> {
        let j = self.expect_type(index, Type::Elastic)?;
        Ok(&mut self.elastic[j])
    }

    pub fn linear_hardening(&self, index: &[usize]) -> Result<&LinearHardening> {
        let j = self.expect_type(index, Type::LinearHardening)?;
        Ok(&self.linear_hardening[j])
    }

    pub fn linear_hardening_mut(&mut self, index: &[usize]) -> Result<&mut LinearHardening> {
        let j = self.expect_type(index, Type::LinearHardening)?;
        Ok(&mut self.linear_hardening[j])
    }

    /// Stress of one point, regardless of its type (zero if unset).
    pub fn point_stress(&self, index: &[usize]) -> Result<Tensor2> {
        let i = self.ravel(index)?;
        Ok(match self.types[i] {
            Type::Unset => Tensor2::zeros(),
            Type::Elastic => *self.elastic[self.index[i]].stress(),
            Type::LinearHardening => *self.linear_hardening[self.index[i]].stress(),
        })
    }
}

fn point_strain(values: &[f64], i: usize) -> Tensor2 {
    tensor::from_row_slice(&values[9 * i..9 * i + 9])
}

fn check_table_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(MaterialError::ParameterTableLength {
            what,
            expected,
            found,
        })
    }
}

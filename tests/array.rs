mod common;

use approx::assert_relative_eq;
use common::{contract_point, init_tracing, point, random_strain, rng, shear, strain_array};
use elastoplastic::tensor::sigeq;
use elastoplastic::{Array, Elastic, LinearHardening, MaterialError, MaterialPoint, Tensor2, Type};
use ndarray::{arr1, arr2, s, Array2, Array4, ArrayD, Ix4, IxDyn, ShapeBuilder};

/// Rows: Elastic, LinearHardening that stays elastic, LinearHardening that yields.
fn mixed_matrix() -> Array {
    let mut mat = Array::matrix(3, 2);
    mat.set_elastic(&arr2(&[[1, 1], [0, 0], [0, 0]]), 12.3, 45.6)
        .unwrap();
    mat.set_linear_hardening(&arr2(&[[0, 0], [1, 1], [0, 0]]), 12.3, 45.6, 1e4, 1.0)
        .unwrap();
    mat.set_linear_hardening(&arr2(&[[0, 0], [0, 0], [1, 1]]), 12.3, 45.6, 0.1, 1.0)
        .unwrap();
    mat
}

#[test]
fn matrix_of_mixed_models() {
    init_tracing();
    let mut mat = mixed_matrix();
    mat.check().unwrap();

    let eps = strain_array(&[3, 2], |_| shear(0.12, 0.02));
    mat.set_strain(&eps, true).unwrap();

    let sig = mat.stress();
    let epsp = mat.epsp();
    let elastic = Tensor2::new(4.428, 1.824, 0.0, 1.824, 4.428, 0.0, 0.0, 0.0, 4.428);
    for p in 0..4 {
        assert_relative_eq!(point(&sig, p), elastic, epsilon = 1e-12);
        assert_eq!(epsp.as_slice().unwrap()[p], 0.0);
    }

    let mut plastic = LinearHardening::new(12.3, 45.6, 0.1, 1.0).unwrap();
    plastic.set_strain(&shear(0.12, 0.02), true);
    for p in 4..6 {
        assert_relative_eq!(point(&sig, p), *plastic.stress(), epsilon = 1e-12);
        assert_relative_eq!(epsp.as_slice().unwrap()[p], plastic.epsp(), epsilon = 1e-14);
        assert_relative_eq!(sigeq(&point(&sig, p)), plastic.sigy(), epsilon = 1e-10);
    }
    assert!(plastic.epsp() > 0.0);
}

#[test]
fn tangent_reproduces_stress_from_virgin_state() {
    let mut mat = Array::new(&[2, 2, 2]);
    let mut mask = ArrayD::<usize>::zeros(IxDyn(&[2, 2, 2]));
    mask.slice_mut(s![0, .., ..]).fill(1);
    mat.set_elastic(&mask, 3.0, 1.5).unwrap();
    mask.mapv_inplace(|m| 1 - m);
    // without initial yield stress the response is homogeneous of degree one
    mat.set_linear_hardening(&mask, 3.0, 1.5, 0.0, 0.4).unwrap();

    let mut rng = rng();
    let eps = strain_array(&[2, 2, 2], |_| random_strain(&mut rng, 0.1));
    mat.set_strain(&eps, true).unwrap();

    let sig = mat.stress();
    let c = mat.tangent();
    assert_eq!(c.shape(), &[2, 2, 2, 3, 3, 3, 3]);
    for p in 0..8 {
        assert_relative_eq!(contract_point(&c, p, &point(&eps, p)), point(&sig, p), epsilon = 1e-12);
    }
}

#[test]
fn unset_points_read_as_zero() {
    let mut mat = Array::new(&[4]);
    mat.set_elastic(&arr1(&[1, 0, 0, 0]), 1.0, 1.0).unwrap();
    mat.set_linear_hardening(&arr1(&[0, 0, 1, 0]), 1.0, 1.0, 0.01, 0.0)
        .unwrap();
    assert_eq!(mat.check(), Err(MaterialError::Unset { count: 2 }));

    let eps = strain_array(&[4], |_| shear(0.0, 0.5));
    mat.set_strain(&eps, true).unwrap();

    let sig = mat.stress();
    let c = mat.tangent();
    let epsp = mat.epsp();
    for p in [1, 3] {
        assert_eq!(point(&sig, p), Tensor2::zeros());
        assert_eq!(point(&mat.strain(), p), Tensor2::zeros());
        assert!(c.slice(s![p, .., .., .., ..]).iter().all(|&v| v == 0.0));
        assert_eq!(epsp[[p]], 0.0);
    }
    assert!(epsp[[2]] > 0.0);
    assert_eq!(mat.point_stress(&[3]).unwrap(), Tensor2::zeros());
    assert_eq!(mat.point_stress(&[0]).unwrap(), point(&sig, 0));
}

#[test]
fn parameters_from_table() {
    let mut mat = Array::new(&[2, 3]);
    let mask = arr2(&[[1, 1, 1], [0, 0, 0]]);
    let idx = arr2(&[[2, 0, 2], [7, 7, 7]]);
    mat.set_elastic_indexed(&mask, &idx, &[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0])
        .unwrap();

    let mask = arr2(&[[0, 0, 0], [1, 1, 0]]);
    let idx = arr2(&[[9, 9, 9], [1, 0, 9]]);
    mat.set_linear_hardening_indexed(&mask, &idx, &[4.0, 5.0], &[40.0, 50.0], &[0.1, 0.2], &[1.0, 2.0])
        .unwrap();

    assert_eq!(
        mat.kappa(),
        arr2(&[[3.0, 1.0, 3.0], [5.0, 4.0, 0.0]]).into_dyn()
    );
    assert_eq!(
        mat.mu(),
        arr2(&[[30.0, 10.0, 30.0], [50.0, 40.0, 0.0]]).into_dyn()
    );
    let lh = mat.linear_hardening(&[1, 0]).unwrap();
    assert_eq!((lh.sigy0(), lh.hardening()), (0.2, 2.0));
    assert_eq!(mat.types()[[1, 2]], Type::Unset);
}

#[test]
fn parameter_table_errors_leave_array_untouched() {
    let mut mat = Array::new(&[3]);
    let mask = arr1(&[1, 1, 0]);

    let err = mat.set_elastic_indexed(&mask, &arr1(&[0, 2, 0]), &[1.0, 2.0], &[1.0, 2.0]);
    assert_eq!(err, Err(MaterialError::ParameterIndex { index: 2, len: 2 }));

    let err = mat.set_elastic_indexed(&mask, &arr1(&[0, 1, 0]), &[1.0, 2.0], &[1.0]);
    assert!(matches!(
        err,
        Err(MaterialError::ParameterTableLength { what: "mu", expected: 2, found: 1 })
    ));

    let err = mat.set_linear_hardening_indexed(
        &mask,
        &arr1(&[0, 0, 0]),
        &[1.0],
        &[1.0],
        &[-1.0],
        &[0.0],
    );
    assert!(matches!(
        err,
        Err(MaterialError::InvalidParameter { name: "sigy0", .. })
    ));

    let err = mat.set_elastic_indexed(&mask, &arr1(&[0, 0]), &[1.0], &[1.0]);
    assert!(matches!(err, Err(MaterialError::ShapeMismatch { what: "idx", .. })));

    assert_eq!(mat.unset_count(), 3);
}

#[test]
fn assignment_happens_once() {
    let mut mat = Array::matrix(2, 2);
    mat.set_elastic(&arr2(&[[1, 1], [0, 0]]), 1.0, 1.0).unwrap();

    let err = mat.set_linear_hardening(&arr2(&[[0, 0], [1, 1]]).reversed_axes(), 1.0, 1.0, 1.0, 1.0);
    assert_eq!(
        err,
        Err(MaterialError::AlreadyAssigned { index: vec![0, 1] })
    );
    assert_eq!(mat.is_elastic(), arr2(&[[1usize, 1], [0, 0]]).into_dyn());
    assert_eq!(mat.unset_count(), 2);

    let err = mat.set_elastic(&arr2(&[[0, 0], [1, 1]]), -1.0, 1.0);
    assert!(matches!(err, Err(MaterialError::InvalidParameter { name: "kappa", .. })));
    assert_eq!(mat.unset_count(), 2);

    mat.set_linear_hardening(&arr2(&[[0, 0], [1, 1]]), 1.0, 1.0, 1.0, 1.0)
        .unwrap();
    assert!(mat.is_complete());
    assert_eq!(mat.type_ids(), arr2(&[[1usize, 1], [2, 2]]).into_dyn());
}

#[test]
fn wrong_shapes_are_rejected_before_mutation() {
    let mut mat = Array::new(&[2]);
    mat.set_linear_hardening(&arr1(&[1, 1]), 1.0, 1.0, 0.1, 0.0)
        .unwrap();
    mat.set_strain(&strain_array(&[2], |_| shear(0.0, 0.3)), true)
        .unwrap();
    let before = mat.stress();

    let err = mat.set_strain(&Array4::<f64>::zeros((1, 2, 3, 3)), true);
    assert_eq!(
        err,
        Err(MaterialError::ShapeMismatch {
            what: "strain",
            expected: vec![2, 3, 3],
            found: vec![1, 2, 3, 3],
        })
    );
    assert_eq!(mat.stress(), before);

    let err = mat.set_elastic(&arr1(&[1, 0, 0]), 1.0, 1.0);
    assert!(matches!(err, Err(MaterialError::ShapeMismatch { what: "mask", .. })));

    let mut out = ArrayD::<f64>::zeros(IxDyn(&[2, 3]));
    assert!(matches!(
        mat.stress_into(&mut out),
        Err(MaterialError::ShapeMismatch { what: "stress", .. })
    ));
    assert!(matches!(
        mat.epsp_into(&mut Array2::<f64>::zeros((2, 1))),
        Err(MaterialError::ShapeMismatch { what: "epsp", .. })
    ));
}

#[test]
fn in_place_outputs_match_allocating_ones() {
    let mut rng = rng();
    let mut mat = mixed_matrix();
    let eps = strain_array(&[3, 2], |_| random_strain(&mut rng, 0.05));
    mat.set_strain(&eps, true).unwrap();

    let mut sig = ArrayD::<f64>::from_elem(IxDyn(&[3, 2, 3, 3]), f64::NAN);
    let mut strain = sig.clone();
    let mut c = ArrayD::<f64>::from_elem(IxDyn(&[3, 2, 3, 3, 3, 3]), f64::NAN);
    let mut epsp = Array2::<f64>::from_elem((3, 2), f64::NAN);
    mat.stress_into(&mut sig).unwrap();
    mat.strain_into(&mut strain).unwrap();
    mat.tangent_into(&mut c).unwrap();
    mat.epsp_into(&mut epsp).unwrap();

    assert_eq!(sig, mat.stress());
    assert_eq!(strain, eps);
    assert_eq!(c, mat.tangent());
    assert_eq!(epsp.into_dyn(), mat.epsp());

    let mut reversed = ArrayD::<f64>::zeros(IxDyn(&[3, 2, 3, 3]));
    let mut view = reversed.slice_mut(s![..;-1, .., .., ..]);
    assert_eq!(mat.stress_into(&mut view), Err(MaterialError::NonContiguous));
}

#[test]
fn strain_layout_does_not_matter() {
    let mut rng = rng();
    let eps = strain_array(&[4, 3], |_| random_strain(&mut rng, 0.2));
    let mut fortran = Array4::<f64>::zeros((4, 3, 3, 3).f());
    fortran.assign(&eps.view().into_dimensionality::<Ix4>().unwrap());

    let mut a = Array::matrix(4, 3);
    let mut b = Array::matrix(4, 3);
    for mat in [&mut a, &mut b] {
        mat.set_linear_hardening(&Array2::<usize>::ones((4, 3)), 2.0, 1.0, 0.05, 0.1)
            .unwrap();
    }
    a.set_strain(&eps, true).unwrap();
    b.set_strain(&fortran, true).unwrap();
    assert_eq!(a.stress(), b.stress());
    assert_eq!(a.tangent(), b.tangent());
}

#[test]
fn newton_iterations_and_commit() {
    let mut mat = Array::new(&[5]);
    mat.set_linear_hardening(&arr1(&[1, 1, 1, 1, 1]), 5.0, 2.0, 0.05, 0.3)
        .unwrap();
    let mut reference = vec![LinearHardening::new(5.0, 2.0, 0.05, 0.3).unwrap(); 5];
    let mut rng = rng();
    let mut eps = strain_array(&[5], |_| Tensor2::zeros());
    let mut committed = mat.epsp();

    for _ in 0..30 {
        eps += &strain_array(&[5], |_| random_strain(&mut rng, 0.02));
        let trial = strain_array(&[5], |_| random_strain(&mut rng, 0.1));
        mat.set_strain(&trial, false).unwrap();
        mat.set_strain(&eps, true).unwrap();
        let sig = mat.stress();
        let epsp = mat.epsp();

        // reference points never see the trial strain
        for (p, model) in reference.iter_mut().enumerate() {
            model.set_strain(&point(&eps, p), true);
            assert_eq!(point(&sig, p), *model.stress());
            assert_eq!(epsp[[p]], model.epsp());
            assert!(epsp[[p]] >= committed[[p]]);
            model.increment();
        }

        mat.increment();
        committed = mat.epsp();
    }
    assert!(committed.iter().all(|&e| e > 0.0));
}

#[test]
fn large_array_matches_point_models() {
    let n = 1000;
    let mut rng = rng();
    let mut mask = ArrayD::<usize>::zeros(IxDyn(&[n]));
    for p in (0..n).step_by(3) {
        mask[[p]] = 1;
    }
    let mut mat = Array::new(&[n]).with_min_len(16);
    mat.set_elastic(&mask, 2.0, 1.0).unwrap();
    mat.set_linear_hardening(&mask.mapv(|m| 1 - m), 2.0, 1.0, 0.02, 0.5)
        .unwrap();

    let strains: Vec<Tensor2> = (0..n).map(|_| random_strain(&mut rng, 0.05)).collect();
    mat.set_strain(&strain_array(&[n], |p| strains[p]), true)
        .unwrap();
    let sig = mat.stress();

    let elastic = Elastic::new(2.0, 1.0).unwrap();
    for (p, eps) in strains.iter().enumerate() {
        let expected = if p % 3 == 0 {
            elastic.compute_stress(eps)
        } else {
            LinearHardening::new(2.0, 1.0, 0.02, 0.5)
                .unwrap()
                .compute_stress(eps)
        };
        assert_relative_eq!(point(&sig, p), expected, epsilon = 1e-12);
    }
}

#[test]
fn point_access_through_the_array() {
    let mut mat = mixed_matrix();
    mat.elastic_mut(&[0, 1])
        .unwrap()
        .set_strain(&shear(0.12, 0.02), false);
    assert_relative_eq!(mat.point_stress(&[0, 1]).unwrap()[(0, 1)], 1.824, epsilon = 1e-12);
    assert_eq!(mat.point_stress(&[0, 0]).unwrap(), Tensor2::zeros());

    mat.linear_hardening_mut(&[2, 0])
        .unwrap()
        .set_strain(&shear(0.0, 1.0), false);
    assert!(mat.epsp()[[2, 0]] > 0.0);
    assert_eq!(mat.epsp()[[2, 1]], 0.0);

    assert!(matches!(
        mat.elastic_mut(&[1, 0]),
        Err(MaterialError::WrongType { found: Type::LinearHardening, .. })
    ));
    assert!(matches!(
        mat.point_stress(&[3, 0]),
        Err(MaterialError::IndexOutOfBounds { .. })
    ));
}

use frx_codegen::{ArgSpec, Intent, KernelArg};
use frx_device::{HostAllocator, Matrix, MatrixBank, MpiView, Operand, View, operands};
use frx_dtype::{NativeType, ScalarDType};

use crate::marshal::{BoundArg, NativeArg, build_arglist, resolve_args};
use crate::Error;

const F64: ScalarDType = ScalarDType::Float64;

fn matrix(nrow: usize, ncol: usize) -> Matrix {
    Matrix::zeros(&HostAllocator, F64, nrow, ncol).unwrap()
}

#[test]
fn test_dims_come_first() {
    let y = matrix(3, 4);
    let spec = ArgSpec::new(2, &[KernelArg::matrix("y", Intent::InOut, F64)]);

    let args = build_arglist(&[3, 4], &spec, &operands! { "y" => &y }).unwrap();

    assert_eq!(resolve_args(&args), vec![NativeArg::I32(3), NativeArg::I32(4), NativeArg::Ptr(y.address())]);
}

#[test]
fn test_strided_matrix_adds_leadsubdim() {
    let m = Matrix::builder()
        .allocator(&HostAllocator)
        .dtype(F64)
        .nrow(2)
        .ncol(3)
        .leaddim(8)
        .leadsubdim(4)
        .build()
        .unwrap();
    let spec = ArgSpec::new(1, &[KernelArg::strided_matrix("m", Intent::In, F64)]);

    let args = build_arglist(&[16], &spec, &operands! { "m" => &m }).unwrap();

    assert_eq!(resolve_args(&args), vec![NativeArg::I32(16), NativeArg::Ptr(m.address()), NativeArg::I32(4)]);
}

#[test]
fn test_views_expand_to_mapping_and_strides() {
    let a = matrix(4, 4);
    let view = View::new(&HostAllocator, &[&a, &a], &[0, 2], &[0, 1], None, [1, 2]).unwrap();
    let mpi = MpiView::new(&HostAllocator, &[&a], &[1], &[1], None, [2, 2]).unwrap();
    let spec = ArgSpec::new(
        1,
        &[KernelArg::view("v", Intent::In, F64), KernelArg::mpi_view("w", Intent::InOut, F64)],
    );

    let args = build_arglist(&[2], &spec, &operands! { "v" => view.clone(), "w" => mpi.clone() }).unwrap();

    assert_eq!(
        resolve_args(&args),
        vec![
            NativeArg::I32(2),
            NativeArg::Ptr(view.mapping().address()),
            NativeArg::Ptr(view.strides().address()),
            NativeArg::Ptr(mpi.view().mapping().address()),
            NativeArg::Ptr(mpi.view().strides().address()),
        ]
    );
}

#[test]
fn test_scalars_cast_to_declared_type() {
    let spec = ArgSpec::new(
        0,
        &[KernelArg::scalar("alpha", ScalarDType::Float32), KernelArg::scalar("n", ScalarDType::Int32)],
    );

    let args = build_arglist(&[], &spec, &operands! { "alpha" => 2.5, "n" => 7.0 }).unwrap();

    assert_eq!(resolve_args(&args), vec![NativeArg::F32(2.5), NativeArg::I32(7)]);
    assert_eq!(args[0].native_type(), NativeType::Scalar(ScalarDType::Float32));
}

#[test]
fn test_pointer() {
    let spec = ArgSpec::new(0, &[KernelArg::pointer("fn")]);
    let args = build_arglist(&[], &spec, &operands! { "fn" => Operand::Pointer(0xdead_beef) }).unwrap();
    assert_eq!(resolve_args(&args), vec![NativeArg::Ptr(0xdead_beef)]);
}

#[test]
fn test_bank_follows_active_member() {
    let members = vec![matrix(2, 2), matrix(2, 2)];
    let bank = MatrixBank::new(members.clone(), 0).unwrap();
    let spec = ArgSpec::new(1, &[KernelArg::matrix("x", Intent::In, F64)]);

    let args = build_arglist(&[4], &spec, &operands! { "x" => bank.clone() }).unwrap();
    assert!(matches!(args[1], BoundArg::Bank(_)));
    assert_eq!(args[1].resolve(), NativeArg::Ptr(members[0].address()));

    bank.set_active(1).unwrap();
    assert_eq!(args[1].resolve(), NativeArg::Ptr(members[1].address()));
}

#[test]
fn test_missing_operand() {
    let spec = ArgSpec::new(1, &[KernelArg::matrix("y", Intent::InOut, F64)]);
    let result = build_arglist(&[4], &spec, &operands! {});
    assert!(matches!(result, Err(Error::ArgumentMismatch { .. })));
}

#[test]
fn test_wrong_operand_kind() {
    let y = matrix(2, 2);
    let spec = ArgSpec::new(1, &[KernelArg::scalar("alpha", F64)]);
    let result = build_arglist(&[4], &spec, &operands! { "alpha" => &y });
    assert!(matches!(result, Err(Error::ArgumentMismatch { .. })));

    let spec = ArgSpec::new(1, &[KernelArg::view("v", Intent::In, F64)]);
    let result = build_arglist(&[4], &spec, &operands! { "v" => &y });
    assert!(matches!(result, Err(Error::ArgumentMismatch { .. })));
}

#[test]
fn test_dimension_count_and_range() {
    let y = matrix(2, 2);
    let spec = ArgSpec::new(1, &[KernelArg::matrix("y", Intent::InOut, F64)]);

    assert!(matches!(build_arglist(&[2, 2], &spec, &operands! { "y" => &y }), Err(Error::ArgumentMismatch { .. })));
    assert!(matches!(
        build_arglist(&[i32::MAX as usize + 1], &spec, &operands! { "y" => &y }),
        Err(Error::ArgumentMismatch { .. })
    ));
}

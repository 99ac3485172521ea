use frx_dtype::ScalarDType;

use crate::{Error, HostAllocator, Matrix, MpiView, View};

fn read_mapping(view: &View) -> Vec<u64> {
    let mut out = vec![0u64; view.n()];
    view.mapping().copyout(0, bytemuck::cast_slice_mut(&mut out)).unwrap();
    out
}

fn read_strides(view: &View) -> Vec<i32> {
    let mut out = vec![0i32; view.n()];
    view.strides().copyout(0, bytemuck::cast_slice_mut(&mut out)).unwrap();
    out
}

#[test]
fn test_mapping_addresses() {
    let a = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 4, 5).unwrap();
    let b = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 2, 3).unwrap();

    let view = View::new(&HostAllocator, &[&a, &b, &a], &[1, 0, 2], &[2, 1, 0], None, [1, 2]).unwrap();

    assert_eq!(view.n(), 3);
    assert_eq!((view.nvrow(), view.nvcol()), (1, 2));
    assert_eq!(view.dtype(), ScalarDType::Float64);
    assert_eq!(read_mapping(&view), vec![a.address() + (5 + 2) * 8, b.address() + 8, a.address() + 10 * 8]);
    assert_eq!(read_strides(&view), vec![5, 3, 5]);
    assert_eq!(view.backing().len(), 2);
}

#[test]
fn test_explicit_row_strides() {
    let a = Matrix::zeros(&HostAllocator, ScalarDType::Float32, 6, 4).unwrap();

    let view = View::new(&HostAllocator, &[&a, &a], &[0, 1], &[0, 1], Some(&[8, 4]), [2, 2]).unwrap();
    assert_eq!(read_strides(&view), vec![8, 4]);
}

#[test]
fn test_block_exceeds_matrix() {
    let a = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 2, 3).unwrap();

    let result = View::new(&HostAllocator, &[&a], &[0], &[2], None, [1, 2]);
    assert!(matches!(result, Err(Error::InvalidView { .. })));

    let result = View::new(&HostAllocator, &[&a], &[1], &[0], None, [2, 1]);
    assert!(matches!(result, Err(Error::InvalidView { .. })));
}

#[test]
fn test_huge_indices_rejected() {
    let a = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 2, 3).unwrap();

    let result = View::new(&HostAllocator, &[&a], &[usize::MAX], &[0], None, [1, 1]);
    assert!(matches!(result, Err(Error::InvalidView { .. })));

    let result = View::new(&HostAllocator, &[&a], &[0], &[usize::MAX], None, [1, 1]);
    assert!(matches!(result, Err(Error::InvalidView { .. })));

    let result = View::new(&HostAllocator, &[&a], &[0], &[0], Some(&[usize::MAX]), [2, 1]);
    assert!(matches!(result, Err(Error::InvalidView { .. })));
}

#[test]
fn test_mismatched_maps() {
    let a = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 2, 3).unwrap();

    let result = View::new(&HostAllocator, &[&a, &a], &[0], &[0, 1], None, [1, 1]);
    assert!(matches!(result, Err(Error::InvalidView { .. })));
}

#[test]
fn test_mixed_dtypes() {
    let a = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 2, 3).unwrap();
    let b = Matrix::zeros(&HostAllocator, ScalarDType::Float32, 2, 3).unwrap();

    let result = View::new(&HostAllocator, &[&a, &b], &[0, 0], &[0, 0], None, [1, 1]);
    assert!(matches!(result, Err(Error::InvalidView { .. })));
}

#[test]
fn test_empty_view() {
    let result = View::new(&HostAllocator, &[], &[], &[], None, [1, 1]);
    assert!(matches!(result, Err(Error::EmptyShape { .. })));
}

#[test]
fn test_mpi_view_exchange_matrix() {
    let a = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 4, 4).unwrap();

    let mpi = MpiView::new(&HostAllocator, &[&a, &a, &a], &[0, 1, 2], &[0, 0, 0], None, [1, 3]).unwrap();

    assert_eq!(mpi.n(), 3);
    assert_eq!((mpi.mpimat().nrow(), mpi.mpimat().ncol()), (3, 3));
    assert_eq!(mpi.mpimat().dtype(), ScalarDType::Float64);
}

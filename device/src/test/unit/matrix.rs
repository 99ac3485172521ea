use frx_dtype::ScalarDType;
use test_case::test_case;

use crate::{Density, Error, HostAllocator, Matrix};

#[test]
fn test_zeros_defaults() {
    let m = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 3, 4).unwrap();

    assert_eq!(m.leaddim(), 4);
    assert_eq!(m.leadsubdim(), 4);
    assert_eq!(m.density(), Density::Dense);
    assert_eq!(m.traits().nbytes(), 3 * 4 * 8);
    assert_eq!(m.get::<f64>().unwrap(), vec![0.0; 12]);
}

#[test]
fn test_set_get_with_padding() {
    let m = Matrix::builder()
        .allocator(&HostAllocator)
        .dtype(ScalarDType::Float32)
        .nrow(2)
        .ncol(3)
        .leaddim(8)
        .build()
        .unwrap();

    let data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
    m.set(&data).unwrap();

    assert_eq!(m.storage().size(), 2 * 8 * 4);
    assert_eq!(m.get::<f32>().unwrap(), data);

    // Padding stays zero.
    let mut raw = vec![0f32; 16];
    m.storage().copyout(0, bytemuck::cast_slice_mut(&mut raw)).unwrap();
    assert_eq!(&raw[..3], &[1.0, 2.0, 3.0]);
    assert_eq!(&raw[3..8], &[0.0; 5]);
    assert_eq!(&raw[8..11], &[4.0, 5.0, 6.0]);
}

#[test]
fn test_from_rows_and_fill() {
    let m = Matrix::from_rows(&HostAllocator, 2, 2, &[1i32, 2, 3, 4]).unwrap();
    assert_eq!(m.dtype(), ScalarDType::Int32);
    assert_eq!(m.get::<i32>().unwrap(), vec![1, 2, 3, 4]);

    m.fill(7i32).unwrap();
    assert_eq!(m.get::<i32>().unwrap(), vec![7; 4]);
}

#[test_case(0, 4 ; "zero rows")]
#[test_case(4, 0 ; "zero cols")]
fn test_empty_shape_rejected(nrow: usize, ncol: usize) {
    let result = Matrix::zeros(&HostAllocator, ScalarDType::Float64, nrow, ncol);
    assert!(matches!(result, Err(Error::EmptyShape { .. })));
}

#[test]
fn test_leaddim_smaller_than_ncol() {
    let result =
        Matrix::builder().allocator(&HostAllocator).dtype(ScalarDType::Float64).nrow(2).ncol(4).leaddim(3).build();
    assert!(matches!(result, Err(Error::InvalidLayout { .. })));
}

#[test]
fn test_dtype_mismatch() {
    let m = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 1, 2).unwrap();

    assert!(matches!(m.set(&[1.0f32, 2.0]), Err(Error::DTypeMismatch { .. })));
    assert!(matches!(m.get::<f32>(), Err(Error::DTypeMismatch { .. })));
}

#[test]
fn test_size_mismatch() {
    let m = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 2, 2).unwrap();
    assert!(matches!(m.set(&[1.0f64; 3]), Err(Error::SizeMismatch { expected: 4, actual: 3 })));
}

#[test]
fn test_clone_shares_storage() {
    let a = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 2, 2).unwrap();
    let b = a.clone();
    let c = Matrix::zeros(&HostAllocator, ScalarDType::Float64, 2, 2).unwrap();

    assert!(a.same_storage(&b));
    assert!(!a.same_storage(&c));
    assert_eq!(a.traits(), c.traits());

    b.fill(3.0f64).unwrap();
    assert_eq!(a.get::<f64>().unwrap(), vec![3.0; 4]);
}

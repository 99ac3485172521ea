use frx_device::{HostAllocator, Matrix, MpiView};

use super::support::host_provider;
use crate::packing::PackingKernels;

/// Blocks (0,0), (1,2) and (3,1) of 1x2 elements over a 4x4 matrix holding 0..16.
fn exchange_view() -> (Matrix, MpiView) {
    let data: Vec<f64> = (0..16).map(f64::from).collect();
    let a = Matrix::from_rows(&HostAllocator, 4, 4, &data).unwrap();
    let mv = MpiView::new(&HostAllocator, &[&a, &a, &a], &[0, 1, 3], &[0, 2, 1], None, [1, 2]).unwrap();
    (a, mv)
}

#[test]
fn test_pack() {
    let provider = host_provider();
    let packing = PackingKernels::new(provider.clone()).unwrap();
    let (_a, mv) = exchange_view();

    packing.pack(&mv).unwrap().run(&[]).unwrap();

    assert_eq!(mv.mpimat().get::<f64>().unwrap(), vec![0.0, 6.0, 13.0, 1.0, 7.0, 14.0]);
}

#[test]
fn test_unpack() {
    let provider = host_provider();
    let packing = PackingKernels::new(provider.clone()).unwrap();
    let (a, mv) = exchange_view();

    mv.mpimat().set(&[100.0f64, 101.0, 102.0, 103.0, 104.0, 105.0]).unwrap();
    packing.unpack(&mv).unwrap().run(&[]).unwrap();

    let out = a.get::<f64>().unwrap();
    assert_eq!(out[0], 100.0);
    assert_eq!(out[1], 103.0);
    assert_eq!(out[6], 101.0);
    assert_eq!(out[7], 104.0);
    assert_eq!(out[13], 102.0);
    assert_eq!(out[14], 105.0);
    assert_eq!(out[2], 2.0);
    assert_eq!(out[15], 15.0);
}

#[test]
fn test_pack_then_unpack_restores() {
    let provider = host_provider();
    let packing = PackingKernels::new(provider.clone()).unwrap();
    let (a, mv) = exchange_view();
    let before = a.get::<f64>().unwrap();

    packing.pack(&mv).unwrap().run(&[]).unwrap();
    packing.unpack(&mv).unwrap().run(&[]).unwrap();

    assert_eq!(a.get::<f64>().unwrap(), before);
    assert_eq!(provider.module_of("pack").as_deref(), Some(frx_codegen::templates::PACK));
}

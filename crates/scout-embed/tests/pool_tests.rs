use candle_core::{DType, Device, Tensor};
use scout_embed::{l2_normalize, masked_mean_l2};

fn assert_close(got: &[f32], want: &[f32]) {
    assert_eq!(got.len(), want.len());
    for (a, b) in got.iter().zip(want) {
        assert!((a - b).abs() < 1e-5, "got {got:?}, want {want:?}");
    }
}

#[test]
fn padding_tokens_do_not_shift_the_sentence_vector() {
    let dev = Device::Cpu;
    // one input of two tokens, the second is padding
    let hidden = Tensor::from_slice(&[3.0f32, 0.0, 4.0, 0.0, 90.0, -7.0, 1.0, 2.0], (1, 2, 4), &dev).unwrap();
    let mask = Tensor::from_slice(&[1u32, 0], (1, 2), &dev).unwrap();
    let rows: Vec<Vec<f32>> = masked_mean_l2(&hidden, &mask).unwrap().to_vec2().unwrap();
    assert_close(&rows[0], &[0.6, 0.0, 0.8, 0.0]);
}

#[test]
fn each_row_of_a_batch_is_averaged_separately() {
    let dev = Device::Cpu;
    let hidden = Tensor::from_slice(
        &[1.0f32, 0.0, 3.0, 0.0, /* row 2 */ 0.0, 2.0, 0.0, 4.0],
        (2, 2, 2),
        &dev,
    )
    .unwrap();
    let mask = Tensor::from_slice(&[1u32, 1, 1, 1], (2, 2), &dev).unwrap();
    let rows: Vec<Vec<f32>> = masked_mean_l2(&hidden, &mask).unwrap().to_vec2().unwrap();
    assert_close(&rows[0], &[1.0, 0.0]);
    assert_close(&rows[1], &[0.0, 1.0]);
}

#[test]
fn fully_padded_row_stays_finite() {
    let dev = Device::Cpu;
    let hidden = Tensor::ones((1, 3, 2), DType::F32, &dev).unwrap();
    let mask = Tensor::zeros((1, 3), DType::U32, &dev).unwrap();
    let rows: Vec<Vec<f32>> = masked_mean_l2(&hidden, &mask).unwrap().to_vec2().unwrap();
    assert!(rows[0].iter().all(|x| x.is_finite()));
}

#[test]
fn mismatched_shapes_are_rejected() {
    let dev = Device::Cpu;
    let flat = Tensor::zeros((2, 4), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&flat, &Tensor::ones((2, 1), DType::F32, &dev).unwrap()).is_err());

    let hidden = Tensor::zeros((1, 3, 4), DType::F32, &dev).unwrap();
    assert!(masked_mean_l2(&hidden, &Tensor::ones((1, 2), DType::F32, &dev).unwrap()).is_err());
}

#[test]
fn l2_normalize_gives_unit_rows() {
    let dev = Device::Cpu;
    let rows = Tensor::from_slice(&[6.0f32, 8.0, 0.0, -2.0], (2, 2), &dev).unwrap();
    let out: Vec<Vec<f32>> = l2_normalize(&rows).unwrap().to_vec2().unwrap();
    assert_close(&out[0], &[0.6, 0.8]);
    assert_close(&out[1], &[0.0, -1.0]);
}

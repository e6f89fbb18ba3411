//! Integration tests for raster-rs crates.
//!
//! Randomized layout tests with fixed seeds: every run draws the same models
//! and values, so a failure reproduces exactly.

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use raster_core::{DataBuffer, DataType, Error, Rect, Result, TransferData};
    use raster_model::{
        BandedSampleModel, ComponentSampleModel, MultiPixelPackedSampleModel, Raster, ReadRaster,
        SampleModel, SinglePixelPackedSampleModel, WriteRaster,
    };
    use std::sync::Arc;

    const SEED: u64 = 0x5eed_2026;
    const ROUNDS: usize = 48;
    const PACKABLE: [DataType; 3] = [DataType::Byte, DataType::UShort, DataType::Int];

    fn random_size(rng: &mut StdRng) -> (i32, i32) {
        (rng.random_range(1..=12), rng.random_range(1..=9))
    }

    fn random_ranks(rng: &mut StdRng, bands: usize) -> Vec<usize> {
        let mut ranks: Vec<usize> = (0..bands).collect();
        ranks.shuffle(rng);
        ranks
    }

    fn random_component(rng: &mut StdRng) -> ComponentSampleModel {
        let dt = DataType::ALL[rng.random_range(0..DataType::ALL.len())];
        let (w, h) = random_size(rng);
        let (wu, hu) = (w as usize, h as usize);
        let bands = rng.random_range(1..=4usize);
        let ranks = random_ranks(rng, bands);
        match rng.random_range(0..3) {
            // pixel interleaved, padded, bands spread over banks
            0 => {
                let ps = bands + rng.random_range(0..3usize);
                let ss = wu * ps + rng.random_range(0..4usize);
                let banks: Vec<usize> = (0..bands).map(|_| rng.random_range(0..3)).collect();
                ComponentSampleModel::with_banks(dt, w, h, ps, ss, &banks, &ranks).unwrap()
            }
            // band interleaved by line
            1 => {
                let offsets: Vec<usize> = ranks.iter().map(|r| r * wu).collect();
                ComponentSampleModel::new(dt, w, h, 1, bands * wu, &offsets).unwrap()
            }
            // planar
            _ => {
                let offsets: Vec<usize> = ranks.iter().map(|r| r * wu * hu).collect();
                ComponentSampleModel::new(dt, w, h, 1, wu, &offsets).unwrap()
            }
        }
    }

    fn random_banded(rng: &mut StdRng) -> BandedSampleModel {
        let dt = DataType::ALL[rng.random_range(0..DataType::ALL.len())];
        let (w, h) = random_size(rng);
        let bands = rng.random_range(1..=4usize);
        let plane = (w * h) as usize;
        let offsets: Vec<usize> = random_ranks(rng, bands).iter().map(|r| r * plane).collect();
        match rng.random_range(0..3) {
            0 => BandedSampleModel::new(dt, w, h, bands).unwrap(),
            // every plane in bank 0
            1 => BandedSampleModel::with_layout(dt, w, h, w as usize, &vec![0; bands], &offsets)
                .unwrap(),
            // some banks shared, some holding a single band
            _ => {
                let banks: Vec<usize> = (0..bands).map(|_| rng.random_range(0..bands)).collect();
                BandedSampleModel::with_layout(dt, w, h, w as usize, &banks, &offsets).unwrap()
            }
        }
    }

    fn random_multi_packed(rng: &mut StdRng) -> MultiPixelPackedSampleModel {
        let dt = PACKABLE[rng.random_range(0..PACKABLE.len())];
        let eb = dt.bits();
        let choices: Vec<u32> = [1, 2, 4, 8, 16, 32]
            .into_iter()
            .filter(|b| eb % b == 0)
            .collect();
        let bits = choices[rng.random_range(0..choices.len())];
        let (w, h) = random_size(rng);
        let dbo = rng.random_range(0..4usize) * bits as usize;
        let row = (dbo + w as usize * bits as usize).div_ceil(eb as usize);
        let ss = row + rng.random_range(0..2usize);
        MultiPixelPackedSampleModel::with_layout(dt, w, h, bits, ss, dbo).unwrap()
    }

    fn random_single_packed(rng: &mut StdRng) -> SinglePixelPackedSampleModel {
        let dt = PACKABLE[rng.random_range(0..PACKABLE.len())];
        let eb = dt.bits();
        let bands = rng.random_range(1..=4u32);
        let mut masks = Vec::with_capacity(bands as usize);
        let mut shift = 0;
        for _ in 0..bands {
            let size = rng.random_range(1..=eb / bands);
            masks.push((((1u64 << size) - 1) << shift) as u32);
            shift += size;
        }
        masks.shuffle(rng);
        let (w, h) = random_size(rng);
        let ss = w as usize + rng.random_range(0..3usize);
        SinglePixelPackedSampleModel::with_stride(dt, w, h, ss, &masks).unwrap()
    }

    fn random_models(rng: &mut StdRng) -> Vec<Box<dyn SampleModel>> {
        vec![
            Box::new(random_component(rng)),
            Box::new(random_banded(rng)),
            Box::new(random_multi_packed(rng)),
            Box::new(random_single_packed(rng)),
        ]
    }

    /// A value `band` stores unchanged: the full signed range for short and
    /// int samples, exact integers for float, unsigned bit width otherwise.
    fn random_value(sm: &dyn SampleModel, band: usize, rng: &mut StdRng) -> i32 {
        let bits = sm.sample_size(band).unwrap();
        match sm.data_type() {
            DataType::Short => rng.random_range(i16::MIN as i32..=i16::MAX as i32),
            DataType::Float => rng.random_range(-(1 << 24)..=1 << 24),
            DataType::Double => rng.random::<i32>(),
            _ if bits >= 32 => rng.random::<i32>(),
            _ => rng.random_range(0..=((1u32 << bits) - 1) as i32),
        }
    }

    fn rejects_position<T: std::fmt::Debug>(result: Result<T>) -> bool {
        matches!(
            result,
            Err(Error::OutOfBounds { .. } | Error::InvalidRegion { .. })
        )
    }

    /// Writes a random value to every sample in random order; returns them
    /// indexed by `(y * width + x) * bands + band`.
    fn fill(sm: &dyn SampleModel, buf: &mut DataBuffer, rng: &mut StdRng) -> Vec<i32> {
        let n = sm.num_bands();
        let mut coords: Vec<(i32, i32, usize)> = sm
            .bounds()
            .iter_coords()
            .flat_map(|(x, y)| (0..n).map(move |b| (x, y, b)))
            .collect();
        coords.shuffle(rng);

        let mut expected = vec![0; coords.len()];
        for (x, y, band) in coords {
            let value = random_value(sm, band, rng);
            sm.set_sample(x, y, band, value, buf).unwrap();
            expected[(y * sm.width() + x) as usize * n + band] = value;
        }
        expected
    }

    fn assert_holds(sm: &dyn SampleModel, buf: &DataBuffer, expected: &[i32]) {
        let n = sm.num_bands();
        for (x, y) in sm.bounds().iter_coords() {
            for band in 0..n {
                assert_eq!(
                    sm.sample(x, y, band, buf).unwrap(),
                    expected[(y * sm.width() + x) as usize * n + band],
                    "{:?} at ({x}, {y}) band {band}",
                    sm.kind()
                );
            }
        }
    }

    #[test]
    fn test_roundtrip_all_layouts() {
        let mut rng = StdRng::seed_from_u64(SEED);
        for _ in 0..ROUNDS {
            for sm in random_models(&mut rng) {
                let mut buf = sm.create_data_buffer().unwrap();
                assert_eq!(buf.size(), sm.buffer_size());
                assert_eq!(buf.num_banks(), sm.num_banks());
                let expected = fill(sm.as_ref(), &mut buf, &mut rng);
                assert_holds(sm.as_ref(), &buf, &expected);
            }
        }
    }

    #[test]
    fn test_double_roundtrip_all_layouts() {
        let mut rng = StdRng::seed_from_u64(SEED ^ 9);
        for _ in 0..ROUNDS {
            for sm in random_models(&mut rng) {
                let mut buf = sm.create_data_buffer().unwrap();
                let n = sm.num_bands();
                let mut expected = Vec::with_capacity((sm.width() * sm.height()) as usize * n);
                for (x, y) in sm.bounds().iter_coords() {
                    for band in 0..n {
                        let value = match sm.data_type() {
                            DataType::Float | DataType::Double => rng.random_range(-1.0e4..1.0e4),
                            _ => random_value(sm.as_ref(), band, &mut rng) as f64,
                        };
                        sm.set_sample_double(x, y, band, value, &mut buf).unwrap();
                        expected.push(match sm.data_type() {
                            DataType::Float => value as f32 as f64,
                            _ => value,
                        });
                    }
                }

                let mut k = 0;
                for (x, y) in sm.bounds().iter_coords() {
                    let pixel = sm.pixel_double(x, y, &buf).unwrap();
                    for band in 0..n {
                        assert_relative_eq!(pixel[band], expected[k], max_relative = 1e-12);
                        assert_relative_eq!(
                            sm.sample_float(x, y, band, &buf).unwrap() as f64,
                            expected[k],
                            max_relative = 1e-6
                        );
                        k += 1;
                    }
                }
                assert_eq!(sm.pixels_double(sm.bounds(), &buf).unwrap().len(), expected.len());
            }
        }
    }

    #[test]
    fn test_subset_reads_parent_samples() {
        let mut rng = StdRng::seed_from_u64(SEED ^ 1);
        for _ in 0..ROUNDS {
            for sm in random_models(&mut rng) {
                let mut buf = sm.create_data_buffer().unwrap();
                fill(sm.as_ref(), &mut buf, &mut rng);

                let n = sm.num_bands();
                let len = rng.random_range(1..=n);
                let select: Vec<usize> = (0..len).map(|_| rng.random_range(0..n)).collect();
                let sub = sm.create_subset_sample_model(&select).unwrap();
                assert_eq!(sub.num_bands(), len);
                assert_eq!(sub.kind(), sm.kind());

                for (x, y) in sm.bounds().iter_coords() {
                    for (k, &band) in select.iter().enumerate() {
                        assert_eq!(
                            sub.sample(x, y, k, &buf).unwrap(),
                            sm.sample(x, y, band, &buf).unwrap()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_subset_rejects_extra_bands() {
        let sm = ComponentSampleModel::pixel_interleaved(DataType::Byte, 2, 2, 2).unwrap();
        assert!(matches!(
            sm.create_subset_sample_model(&[0, 1, 0]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_multi_pixel_packing_density() {
        let mut rng = StdRng::seed_from_u64(SEED ^ 2);
        for _ in 0..ROUNDS {
            let sm = random_multi_packed(&mut rng);
            let eb = sm.data_type().bits();
            let bits = sm.pixel_bit_stride();
            assert_eq!(eb % bits, 0);

            for y in 0..sm.height() {
                let mut ranges: Vec<(u64, u64)> = (0..sm.width())
                    .map(|x| {
                        let loc = sm.sample_location(x, y, 0).unwrap();
                        assert!(loc.shift + loc.bits <= eb);
                        let start = loc.index as u64 * eb as u64 + (eb - loc.shift - loc.bits) as u64;
                        (start, start + loc.bits as u64)
                    })
                    .collect();
                ranges.sort_unstable();
                for pair in ranges.windows(2) {
                    assert!(pair[0].1 <= pair[1].0, "overlapping pixels {pair:?}");
                }
            }
        }
    }

    #[test]
    fn test_multi_pixel_rejects_straddling_pixels() {
        for dt in PACKABLE {
            for bits in [3, 5, 6, 7, 12, 24] {
                assert!(matches!(
                    MultiPixelPackedSampleModel::new(dt, 4, 4, bits),
                    Err(Error::InvalidBitsPerPixel { .. })
                ));
            }
        }
    }

    #[test]
    fn test_single_pixel_mask_contiguity() {
        let mut rng = StdRng::seed_from_u64(SEED ^ 3);
        for _ in 0..ROUNDS * 8 {
            let masks: Vec<u32> = (0..rng.random_range(1..=3))
                .map(|_| {
                    if rng.random_bool(0.5) {
                        let size = rng.random_range(1..=16u32);
                        let shift = rng.random_range(0..=32 - size);
                        (((1u64 << size) - 1) << shift) as u32
                    } else {
                        rng.random::<u32>()
                    }
                })
                .collect();

            match SinglePixelPackedSampleModel::new(DataType::Int, 3, 2, &masks) {
                Ok(sm) => {
                    let mut buf = sm.create_data_buffer().unwrap();
                    for i in 0..buf.size() {
                        buf.set_elem(i, rng.random::<i32>());
                    }
                    for (band, &mask) in sm.bit_masks().iter().enumerate() {
                        let size = sm.bit_sizes()[band];
                        assert_eq!(size, mask.count_ones());
                        if mask != 0 {
                            let run = mask >> mask.trailing_zeros();
                            assert_eq!(run.trailing_ones(), size);
                        }
                        let limit = (1u64 << size) - 1;
                        for (x, y) in sm.bounds().iter_coords() {
                            let value = sm.sample(x, y, band, &buf).unwrap() as u32 as u64;
                            assert!(value <= limit);
                        }
                    }
                }
                Err(err) => {
                    assert!(matches!(
                        err,
                        Error::NonContiguousMask { .. } | Error::InvalidArgument(_)
                    ));
                }
            }
        }
    }

    #[test]
    fn test_bounds_enforced_everywhere() {
        let mut rng = StdRng::seed_from_u64(SEED ^ 4);
        for _ in 0..ROUNDS {
            for sm in random_models(&mut rng) {
                let mut buf = sm.create_data_buffer().unwrap();
                let (w, h) = (sm.width(), sm.height());
                let n = sm.num_bands();
                let elements = TransferData::zeroed(sm.transfer_type(), sm.num_data_elements());
                let ints = vec![0; n];
                let doubles = vec![0.0; n];
                for (x, y) in [(-1, 0), (w, 0), (0, -1), (0, h), (w, h)] {
                    assert!(rejects_position(sm.sample(x, y, 0, &buf)));
                    assert!(rejects_position(sm.sample_float(x, y, 0, &buf)));
                    assert!(rejects_position(sm.sample_double(x, y, 0, &buf)));
                    assert!(rejects_position(sm.set_sample(x, y, 0, 1, &mut buf)));
                    assert!(rejects_position(sm.set_sample_float(x, y, 0, 1.0, &mut buf)));
                    assert!(rejects_position(sm.set_sample_double(x, y, 0, 1.0, &mut buf)));
                    assert!(rejects_position(sm.pixel(x, y, &buf)));
                    assert!(rejects_position(sm.pixel_float(x, y, &buf)));
                    assert!(rejects_position(sm.pixel_double(x, y, &buf)));
                    assert!(rejects_position(sm.set_pixel(x, y, &ints, &mut buf)));
                    assert!(rejects_position(sm.set_pixel_double(x, y, &doubles, &mut buf)));
                    assert!(rejects_position(sm.data_elements(x, y, &buf)));
                    assert!(rejects_position(sm.set_data_elements(x, y, &elements, &mut buf)));
                    assert!(rejects_position(sm.sample_location(x, y, 0)));
                }
                assert!(sm.sample(0, 0, n, &buf).unwrap_err().is_bounds_error());

                // large enough for every region below, so only the position can fail
                let room = (w as usize + 2) * 2;
                let region_ints = vec![0; room * n];
                let region_doubles = vec![0.0; room * n];
                let region_elements =
                    TransferData::zeroed(sm.transfer_type(), room * sm.num_data_elements());
                for region in [
                    Rect::new(-1, 0, 1, 1),
                    Rect::new(0, 0, w + 1, 1),
                    Rect::new(0, h - 1, 1, 2),
                    Rect::new(0, -1, 1, 1),
                    Rect::new(0, 0, -1, 1),
                ] {
                    assert!(rejects_position(sm.pixels(region, &buf)));
                    assert!(rejects_position(sm.pixels_double(region, &buf)));
                    assert!(rejects_position(sm.samples(region, 0, &buf)));
                    assert!(rejects_position(sm.set_pixels(region, &region_ints, &mut buf)));
                    assert!(rejects_position(
                        sm.set_pixels_double(region, &region_doubles, &mut buf)
                    ));
                    assert!(rejects_position(
                        sm.set_samples(region, 0, &region_ints[..room], &mut buf)
                    ));
                    assert!(rejects_position(sm.data_elements_rect(region, &buf)));
                    assert!(rejects_position(
                        sm.set_data_elements_rect(region, &region_elements, &mut buf)
                    ));
                }
                assert_eq!(buf, sm.create_data_buffer().unwrap());
            }
        }
    }

    #[test]
    fn test_component_bulk_matches_scalar() {
        let mut rng = StdRng::seed_from_u64(SEED ^ 5);
        for _ in 0..ROUNDS {
            let sm = random_component(&mut rng);
            let mut buf = sm.create_data_buffer().unwrap();
            fill(&sm, &mut buf, &mut rng);

            let rx = rng.random_range(0..sm.width());
            let ry = rng.random_range(0..sm.height());
            let region = Rect::new(
                rx,
                ry,
                rng.random_range(1..=sm.width() - rx),
                rng.random_range(1..=sm.height() - ry),
            );
            let n = sm.num_bands();

            let bulk = sm.pixels(region, &buf).unwrap();
            let mut scalar = Vec::with_capacity(bulk.len());
            for (x, y) in region.iter_coords() {
                for band in 0..n {
                    scalar.push(sm.sample(x, y, band, &buf).unwrap());
                }
            }
            assert_eq!(bulk, scalar);

            for band in 0..n {
                let column: Vec<i32> = scalar.iter().skip(band).step_by(n).copied().collect();
                assert_eq!(sm.samples(region, band, &buf).unwrap(), column);
            }

            let values: Vec<i32> = bulk.iter().map(|v| v.wrapping_add(1).rem_euclid(128)).collect();
            sm.set_pixels(region, &values, &mut buf).unwrap();
            let mut k = 0;
            for (x, y) in region.iter_coords() {
                for band in 0..n {
                    assert_eq!(sm.sample(x, y, band, &buf).unwrap(), values[k]);
                    k += 1;
                }
            }
        }
    }

    #[test]
    fn test_compatible_layouts_do_not_alias() {
        let mut rng = StdRng::seed_from_u64(SEED ^ 6);
        for _ in 0..ROUNDS {
            for sm in random_models(&mut rng) {
                let (w, h) = random_size(&mut rng);
                let c = sm.create_compatible_sample_model(w, h).unwrap();
                assert_eq!(c.kind(), sm.kind());
                assert_eq!(c.num_bands(), sm.num_bands());
                assert_eq!(c.data_type(), sm.data_type());
                assert_eq!((c.width(), c.height()), (w, h));

                let mut buf = c.create_data_buffer().unwrap();
                let expected = fill(c.as_ref(), &mut buf, &mut rng);
                assert_holds(c.as_ref(), &buf, &expected);
            }
        }
    }

    #[test]
    fn test_data_elements_copy_between_buffers() {
        let mut rng = StdRng::seed_from_u64(SEED ^ 7);
        for _ in 0..ROUNDS {
            for sm in random_models(&mut rng) {
                let mut src = sm.create_data_buffer().unwrap();
                let expected = fill(sm.as_ref(), &mut src, &mut rng);
                let mut dst = sm.create_data_buffer().unwrap();
                let all = sm.data_elements_rect(sm.bounds(), &src).unwrap();
                assert_eq!(all.len(), (sm.width() * sm.height()) as usize * sm.num_data_elements());
                sm.set_data_elements_rect(sm.bounds(), &all, &mut dst).unwrap();
                assert_holds(sm.as_ref(), &dst, &expected);
            }
        }
    }

    #[test]
    fn test_banded_example() {
        let sm = BandedSampleModel::new(DataType::Byte, 4, 2, 3).unwrap();
        let mut buf = sm.create_data_buffer().unwrap();
        assert_eq!(buf.num_banks(), 3);
        assert_eq!(sm.scanline_stride(), 4);
        assert!(buf.size() >= 8);

        sm.set_sample(2, 1, 1, 200, &mut buf).unwrap();
        assert_eq!(sm.sample(2, 1, 1, &buf).unwrap(), 200);
        assert_eq!(sm.pixel(2, 1, &buf).unwrap()[1], 200);
    }

    #[test]
    fn test_raster_children_match_model() {
        let mut rng = StdRng::seed_from_u64(SEED ^ 8);
        for _ in 0..ROUNDS {
            for sm in random_models(&mut rng) {
                let mut buf = sm.create_data_buffer().unwrap();
                fill(sm.as_ref(), &mut buf, &mut rng);
                let model: Arc<dyn SampleModel> = Arc::from(sm);
                let (ox, oy) = (rng.random_range(-50..50), rng.random_range(-50..50));
                let raster = Raster::new(Arc::clone(&model), buf, ox, oy).unwrap();

                let (w, h) = (model.width(), model.height());
                let rx = rng.random_range(0..w);
                let ry = rng.random_range(0..h);
                let region = Rect::new(
                    ox + rx,
                    oy + ry,
                    rng.random_range(1..=w - rx),
                    rng.random_range(1..=h - ry),
                );
                let n = model.num_bands();
                let select: Vec<usize> = random_ranks(&mut rng, n);
                let (cx, cy) = (rng.random_range(-9..9), rng.random_range(-9..9));
                let child = raster.child(region, cx, cy, Some(&select)).unwrap();

                for j in 0..region.height {
                    for i in 0..region.width {
                        for (k, &band) in select.iter().enumerate() {
                            assert_eq!(
                                child.sample(cx + i, cy + j, k).unwrap(),
                                model
                                    .sample(rx + i, ry + j, band, raster.data_buffer())
                                    .unwrap()
                            );
                        }
                    }
                }
                assert!(child.sample(cx + region.width, cy, 0).is_err());
            }
        }
    }

    #[test]
    fn test_raster_set_rect_between_layouts() {
        let mut src = Raster::create_banded(DataType::UShort, 5, 4, 3, 0, 0).unwrap();
        let values: Vec<i32> = (0..60).map(|v| v * 7 % 31).collect();
        src.set_pixels(Rect::new(0, 0, 5, 4), &values).unwrap();

        let mut dst =
            Raster::create_packed(DataType::Int, 6, 6, &[0x1f << 10, 0x1f << 5, 0x1f], 0, 0)
                .unwrap();
        dst.set_rect(3, 3, &src).unwrap();

        for (x, y) in Rect::new(3, 3, 3, 3).iter_coords() {
            assert_eq!(dst.pixel(x, y).unwrap(), src.pixel(x - 3, y - 3).unwrap());
        }
        assert_eq!(dst.pixel(2, 2).unwrap(), vec![0, 0, 0]);
    }
}

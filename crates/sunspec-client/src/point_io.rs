//! Point I/O (`spec.md` §4.2): reading and writing individual points,
//! transparently resolving scale-factor dependencies.

use std::future::Future;
use std::pin::Pin;

use sunspec_core::catalog::PointDef;
use sunspec_core::codec;
use sunspec_core::error::SunSpecError;
use sunspec_core::{DeviceImage, PointType};

use crate::transport::ModbusTransport;

fn current_sf_raw(image: &DeviceImage, model_index: usize, point: &PointDef) -> Result<Option<i16>, SunSpecError> {
    match &point.sf {
        None => Ok(None),
        Some(sf_name) => {
            let sf_point = image.model(model_index).point_def(sf_name)?.clone();
            Ok(Some(image.decode_point(model_index, &sf_point) as i16))
        }
    }
}

/// Read a point, recursing into its scale factor first and, if the
/// point itself *is* a scale factor, re-applying every dependent
/// point's scaled value across the change (`spec.md` §4.2 steps 1-4,
/// the idempotence property of §8).
///
/// Boxed because step 1 recurses into `read_point` for the scale-factor
/// point — `async fn` can't be directly recursive.
pub fn read_point<'a>(
    transport: &'a mut dyn ModbusTransport,
    image: &'a mut DeviceImage,
    model_index: usize,
    point_name: &'a str,
) -> Pin<Box<dyn Future<Output = Result<f64, SunSpecError>> + 'a>> {
    Box::pin(async move {
        let point = image.model(model_index).point_def(point_name)?.clone();

        if point.ty == PointType::String {
            return Err(SunSpecError::Internal(format!(
                "read_point called on string point {point_name:?}; use read_point_string"
            )));
        }

        if let Some(sf_name) = point.sf.clone() {
            read_point(transport, image, model_index, &sf_name).await?;
        }

        let addr = image.model(model_index).point_address(&point);
        let bytes = transport.read_holding(addr, point.len).await?;

        if point.ty == PointType::Sunssf {
            apply_idempotent_scale_change(image, model_index, &point, &bytes);
        } else {
            image.set_raw_bytes(model_index, &point, &bytes);
        }

        let sf_raw = current_sf_raw(image, model_index, &point)?;
        let raw = image.decode_point(model_index, &point);
        Ok(codec::scale(raw, sf_raw))
    })
}

/// Capture every dependent point's scaled value under the *old* scale
/// factor, overwrite the factor's raw bytes, then re-encode each
/// dependent's raw register to preserve its scaled value under the
/// *new* factor (`spec.md` §4.2 step 3).
fn apply_idempotent_scale_change(image: &mut DeviceImage, model_index: usize, sf_point: &PointDef, new_bytes: &[u8]) {
    let old_sf_raw = image.decode_point(model_index, sf_point) as i16;

    let dependents: Vec<PointDef> = image.dependents_of(model_index, &sf_point.name).cloned().collect();
    let preserved: Vec<(PointDef, f64)> = dependents
        .into_iter()
        .map(|dep| {
            let dep_raw = image.decode_point(model_index, &dep);
            let scaled = codec::scale(dep_raw, Some(old_sf_raw));
            (dep, scaled)
        })
        .collect();

    image.set_raw_bytes(model_index, sf_point, new_bytes);
    let new_sf_raw = image.decode_point(model_index, sf_point) as i16;

    for (dep, scaled_value) in preserved {
        let new_raw = codec::unscale(scaled_value, Some(new_sf_raw));
        image.encode_point(model_index, &dep, new_raw);
    }
}

/// Read a string-typed point (device names, model/manufacturer fields).
/// Strings carry no scale factor, so this skips the idempotence dance
/// entirely.
pub async fn read_point_string(
    transport: &mut dyn ModbusTransport,
    image: &mut DeviceImage,
    model_index: usize,
    point_name: &str,
) -> Result<String, SunSpecError> {
    let point = image.model(model_index).point_def(point_name)?.clone();
    let addr = image.model(model_index).point_address(&point);
    let bytes = transport.read_holding(addr, point.len).await?;
    image.set_raw_bytes(model_index, &point, &bytes);
    Ok(image.decode_point_str(model_index, &point))
}

/// Write a point's scaled `value`, refreshing its scale factor from the
/// device first (`spec.md` §4.2 "Write a point").
pub async fn write_point(
    transport: &mut dyn ModbusTransport,
    image: &mut DeviceImage,
    model_index: usize,
    point_name: &str,
    value: f64,
) -> Result<(), SunSpecError> {
    let point = image.model(model_index).point_def(point_name)?.clone();

    if let Some(sf_name) = point.sf.clone() {
        read_point(transport, image, model_index, &sf_name).await?;
    }

    let sf_raw = current_sf_raw(image, model_index, &point)?;
    let raw = codec::unscale(value, sf_raw);
    image.encode_point(model_index, &point, raw);

    let addr = image.model(model_index).point_address(&point);
    let bytes = image.raw_bytes(model_index, &point).to_vec();
    transport.write_holding(addr, &bytes).await
}

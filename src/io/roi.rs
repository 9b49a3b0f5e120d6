use gdal::Dataset;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::Result;

const DEFAULT_ROI_CRS: &str = "EPSG:4326";

/// Axis-aligned region of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    /// CRS definition understood by GDAL; EPSG:4326 (lon/lat) when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<String>,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            crs: None,
        }
    }

    /// Parse `min_x,min_y,max_x,max_y`. Returns `None` on malformed or empty boxes.
    pub fn parse(s: &str) -> Option<Self> {
        let values: Vec<f64> = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        match values[..] {
            [min_x, min_y, max_x, max_y] if min_x < max_x && min_y < max_y => {
                Some(Self::new(min_x, min_y, max_x, max_y))
            }
            _ => None,
        }
    }

    pub fn crs(&self) -> &str {
        self.crs.as_deref().unwrap_or(DEFAULT_ROI_CRS)
    }

    /// Overlap of two boxes in the same CRS, `None` if they do not intersect.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);
        if min_x < max_x && min_y < max_y {
            Some(BoundingBox {
                crs: self.crs.clone(),
                ..BoundingBox::new(min_x, min_y, max_x, max_y)
            })
        } else {
            None
        }
    }

    fn from_corners(xs: &[f64], ys: &[f64]) -> Self {
        let fold = |v: &[f64], f: fn(f64, f64) -> f64, init: f64| v.iter().copied().fold(init, f);
        Self::new(
            fold(xs, f64::min, f64::INFINITY),
            fold(ys, f64::min, f64::INFINITY),
            fold(xs, f64::max, f64::NEG_INFINITY),
            fold(ys, f64::max, f64::NEG_INFINITY),
        )
    }
}

/// Crop window in an image's own coordinate space (upper-left, lower-right)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageExtent {
    pub ulx: f64,
    pub uly: f64,
    pub lrx: f64,
    pub lry: f64,
}

impl From<&BoundingBox> for ImageExtent {
    fn from(b: &BoundingBox) -> Self {
        Self {
            ulx: b.min_x,
            uly: b.max_y,
            lrx: b.max_x,
            lry: b.min_y,
        }
    }
}

/// Resolves a configured region of interest against one image.
pub trait RoiResolver {
    /// `Ok(None)` when the region does not overlap the image.
    fn resolve(&self, roi: &BoundingBox, image: &Path) -> Result<Option<ImageExtent>>;
}

/// Resolver reading the image footprint and CRS through GDAL
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalRoiResolver;

impl GdalRoiResolver {
    fn image_crs(dataset: &Dataset) -> Result<SpatialRef> {
        let mut proj = dataset.projection();
        if proj.is_empty() {
            // Fallback to GCP projection if available
            if let Some(gcp_proj) = dataset.gcp_projection() {
                proj = gcp_proj;
            }
        }
        let mut srs = if proj.is_empty() {
            SpatialRef::from_epsg(4326)?
        } else {
            SpatialRef::from_wkt(&proj)?
        };
        srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        Ok(srs)
    }

    fn footprint(dataset: &Dataset) -> Result<BoundingBox> {
        let gt = dataset.geo_transform()?;
        let (size_x, size_y) = dataset.raster_size();
        let (w, h) = (size_x as f64, size_y as f64);
        let corner = |px: f64, py: f64| {
            (
                gt[0] + px * gt[1] + py * gt[2],
                gt[3] + px * gt[4] + py * gt[5],
            )
        };
        let corners = [corner(0.0, 0.0), corner(w, 0.0), corner(0.0, h), corner(w, h)];
        let xs: Vec<f64> = corners.iter().map(|c| c.0).collect();
        let ys: Vec<f64> = corners.iter().map(|c| c.1).collect();
        Ok(BoundingBox::from_corners(&xs, &ys))
    }
}

impl RoiResolver for GdalRoiResolver {
    fn resolve(&self, roi: &BoundingBox, image: &Path) -> Result<Option<ImageExtent>> {
        let dataset = Dataset::open(image)?;
        let footprint = Self::footprint(&dataset)?;

        let mut src = SpatialRef::from_definition(roi.crs())?;
        src.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        let dst = Self::image_crs(&dataset)?;
        let transform = CoordTransform::new(&src, &dst)?;

        let mut xs = [roi.min_x, roi.max_x, roi.min_x, roi.max_x];
        let mut ys = [roi.max_y, roi.max_y, roi.min_y, roi.min_y];
        let mut zs = [0.0; 4];
        transform.transform_coords(&mut xs, &mut ys, &mut zs)?;
        let projected = BoundingBox::from_corners(&xs, &ys);
        debug!("ROI in image CRS: {:?}, footprint: {:?}", projected, footprint);

        Ok(projected
            .intersection(&footprint)
            .map(|overlap| ImageExtent::from(&overlap)))
    }
}

//! OpenCV-backed feature extractor.
//!
//! Uses Farneback dense flow, Shi-Tomasi corners tracked with pyramidal LK,
//! RANSAC partial-affine estimation, the default HOG people detector,
//! Canny + external contours and 5x5 Sobel. Pixel statistics are shared with
//! the raster backend.

use opencv::{
    calib3d,
    core::{self, Mat, Point, Point2f, Rect, Size, TermCriteria, Vec2f, Vector},
    imgproc, objdetect,
    prelude::*,
    video,
};
use std::sync::Mutex;

use super::signals::{
    AffineMotion, BoundingBox, ChannelStats, ColorSpace, Contour, Correspondence, EdgeAnalysis,
    FlowParams, FlowStats, Histogram, SharpnessMap, ValueBands,
};
use super::{FeatureExtractor, RasterExtractor, MIN_AFFINE_CORRESPONDENCES};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Person detection runs on a frame downscaled by this factor.
const HOG_SCALE: f64 = 0.5;

/// Feature extractor backed by OpenCV.
pub struct OpenCvExtractor {
    hog: Mutex<objdetect::HOGDescriptor>,
    stats: RasterExtractor,
}

impl OpenCvExtractor {
    /// Create an extractor with the default HOG people detector loaded.
    pub fn new() -> MediaResult<Self> {
        let mut hog = objdetect::HOGDescriptor::default()
            .map_err(|e| MediaError::detection_failed(format!("hog init: {e}")))?;
        let detector = objdetect::HOGDescriptor::get_default_people_detector()
            .map_err(|e| MediaError::detection_failed(format!("hog people detector: {e}")))?;
        hog.set_svm_detector(&detector)
            .map_err(|e| MediaError::detection_failed(format!("hog set detector: {e}")))?;
        Ok(Self {
            hog: Mutex::new(hog),
            stats: RasterExtractor::new(),
        })
    }
}

fn cv(context: &'static str) -> impl Fn(opencv::Error) -> MediaError {
    move |e| MediaError::detection_failed(format!("{context}: {e}"))
}

fn to_bgr(frame: &Frame) -> MediaResult<Mat> {
    let flat = Mat::from_slice(frame.rgb().as_raw()).map_err(cv("frame buffer"))?;
    let rgb = flat
        .reshape(3, frame.height() as i32)
        .map_err(cv("frame reshape"))?
        .try_clone()
        .map_err(cv("frame clone"))?;
    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR).map_err(cv("rgb2bgr"))?;
    Ok(bgr)
}

fn to_gray(frame: &Frame) -> MediaResult<Mat> {
    let flat = Mat::from_slice(frame.gray().as_raw()).map_err(cv("gray buffer"))?;
    flat.reshape(1, frame.height() as i32)
        .map_err(cv("gray reshape"))?
        .try_clone()
        .map_err(cv("gray clone"))
}

fn laplacian_variance(gray: &impl core::ToInputArray) -> MediaResult<f64> {
    let mut lap = Mat::default();
    imgproc::laplacian(
        gray,
        &mut lap,
        core::CV_64F,
        1,
        1.0,
        0.0,
        core::BORDER_DEFAULT | core::BORDER_ISOLATED,
    )
    .map_err(cv("laplacian"))?;
    let values = lap.data_typed::<f64>().map_err(cv("laplacian data"))?;
    if values.is_empty() {
        return Ok(0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    Ok(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n)
}

impl OpenCvExtractor {
    fn lk_track(&self, prev: &Frame, frame: &Frame) -> MediaResult<(Vector<Point2f>, Vector<Point2f>)> {
        let (g1, g2) = (to_gray(prev)?, to_gray(frame)?);
        let mut corners = Vector::<Point2f>::new();
        imgproc::good_features_to_track_def(&g1, &mut corners, 300, 0.01, 10.0)
            .map_err(cv("good features"))?;
        if corners.is_empty() {
            return Ok((Vector::new(), Vector::new()));
        }

        let mut next = Vector::<Point2f>::new();
        let mut status = Vector::<u8>::new();
        let mut err = Vector::<f32>::new();
        let criteria = TermCriteria::new(
            core::TermCriteria_COUNT + core::TermCriteria_EPS,
            30,
            0.01,
        )
        .map_err(cv("term criteria"))?;
        video::calc_optical_flow_pyr_lk(
            &g1,
            &g2,
            &corners,
            &mut next,
            &mut status,
            &mut err,
            Size::new(21, 21),
            3,
            criteria,
            0,
            1e-4,
        )
        .map_err(cv("pyr lk"))?;

        let mut good_old = Vector::<Point2f>::new();
        let mut good_new = Vector::<Point2f>::new();
        for i in 0..status.len() {
            if status.get(i).map_err(cv("lk status"))? == 1 {
                good_old.push(corners.get(i).map_err(cv("lk corner"))?);
                good_new.push(next.get(i).map_err(cv("lk next"))?);
            }
        }
        Ok((good_old, good_new))
    }
}

impl FeatureExtractor for OpenCvExtractor {
    fn name(&self) -> &'static str {
        "opencv"
    }

    fn compute_flow(
        &self,
        frame: &Frame,
        prev: &Frame,
        params: &FlowParams,
    ) -> MediaResult<FlowStats> {
        let (g1, g2) = (to_gray(prev)?, to_gray(frame)?);
        let mut flow = Mat::default();
        video::calc_optical_flow_farneback(
            &g1,
            &g2,
            &mut flow,
            params.pyr_scale,
            params.levels,
            params.winsize,
            params.iterations,
            params.poly_n,
            params.poly_sigma,
            0,
        )
        .map_err(cv("farneback"))?;

        let (w, h) = (frame.width() as usize, frame.height() as usize);
        let vectors = flow.data_typed::<Vec2f>().map_err(cv("flow data"))?;
        if vectors.is_empty() {
            return Ok(FlowStats::default());
        }
        let (cx, cy) = ((w / 2) as f64, (h / 2) as f64);
        let n = vectors.len() as f64;
        let (mut sum, mut sum_sq, mut sum_dx, mut sum_dy) = (0.0, 0.0, 0.0, 0.0);
        let mut radial = Vec::with_capacity(vectors.len());
        for (i, v) in vectors.iter().enumerate() {
            let (fx, fy) = (v[0] as f64, v[1] as f64);
            let mag = (fx * fx + fy * fy).sqrt();
            sum += mag;
            sum_sq += mag * mag;
            sum_dx += fx;
            sum_dy += fy;
            let (ox, oy) = ((i % w) as f64 - cx, (i / w) as f64 - cy);
            radial.push((fx * ox + fy * oy) / ((ox * ox + oy * oy).sqrt() + 1e-6));
        }
        radial.sort_by(|a, b| a.total_cmp(b));
        let mid = radial.len() / 2;
        let radial_median = if radial.len() % 2 == 0 {
            (radial[mid - 1] + radial[mid]) / 2.0
        } else {
            radial[mid]
        };
        let mean = sum / n;
        Ok(FlowStats {
            magnitude_mean: mean,
            magnitude_std: (sum_sq / n - mean * mean).max(0.0).sqrt(),
            mean_dx: sum_dx / n,
            mean_dy: sum_dy / n,
            radial_median,
        })
    }

    fn track_features(&self, prev: &Frame, frame: &Frame) -> MediaResult<Option<AffineMotion>> {
        let (old, new) = self.lk_track(prev, frame)?;
        if old.len() <= MIN_AFFINE_CORRESPONDENCES {
            return Ok(None);
        }
        let mut inliers = Mat::default();
        let m = calib3d::estimate_affine_partial_2d(
            &old,
            &new,
            &mut inliers,
            calib3d::RANSAC,
            3.0,
            2000,
            0.99,
            10,
        )
        .map_err(cv("estimate affine"))?;
        if m.empty() {
            return Ok(None);
        }
        let at = |r: i32, c: i32| -> MediaResult<f64> {
            m.at_2d::<f64>(r, c).copied().map_err(cv("affine element"))
        };
        Ok(Some(AffineMotion::from_matrix([
            [at(0, 0)?, at(0, 1)?, at(0, 2)?],
            [at(1, 0)?, at(1, 1)?, at(1, 2)?],
        ])))
    }

    fn track_correspondences(
        &self,
        prev: &Frame,
        frame: &Frame,
    ) -> MediaResult<Vec<Correspondence>> {
        let (old, new) = self.lk_track(prev, frame)?;
        Ok(old
            .iter()
            .zip(new.iter())
            .map(|(a, b)| Correspondence::new((a.x as f64, a.y as f64), (b.x as f64, b.y as f64)))
            .collect())
    }

    fn detect_persons(&self, frame: &Frame) -> MediaResult<Vec<BoundingBox>> {
        let bgr = to_bgr(frame)?;
        let mut small = Mat::default();
        imgproc::resize(
            &bgr,
            &mut small,
            Size::new(0, 0),
            HOG_SCALE,
            HOG_SCALE,
            imgproc::INTER_LINEAR,
        )
        .map_err(cv("hog resize"))?;

        let mut found = Vector::<Rect>::new();
        let mut hog = self
            .hog
            .lock()
            .map_err(|_| MediaError::internal("hog detector lock poisoned"))?;
        hog.detect_multi_scale(
            &small,
            &mut found,
            0.5,
            Size::new(4, 4),
            Size::new(8, 8),
            1.05,
            2.0,
            false,
        )
        .map_err(cv("hog detect"))?;

        Ok(found
            .iter()
            .map(|r| {
                BoundingBox::new(
                    (r.x as f64 / HOG_SCALE).trunc(),
                    (r.y as f64 / HOG_SCALE).trunc(),
                    (r.width as f64 / HOG_SCALE).trunc(),
                    (r.height as f64 / HOG_SCALE).trunc(),
                )
            })
            .collect())
    }

    fn channel_stats(&self, frame: &Frame, space: ColorSpace) -> MediaResult<ChannelStats> {
        self.stats.channel_stats(frame, space)
    }

    fn histogram(&self, frame: &Frame, space: ColorSpace, channel: usize) -> MediaResult<Histogram> {
        self.stats.histogram(frame, space, channel)
    }

    fn value_bands(&self, frame: &Frame, low: u8, high: u8) -> MediaResult<ValueBands> {
        self.stats.value_bands(frame, low, high)
    }

    fn sharpness(&self, frame: &Frame) -> MediaResult<f64> {
        laplacian_variance(&to_gray(frame)?)
    }

    fn sharpness_map(&self, frame: &Frame, grid: usize) -> MediaResult<SharpnessMap> {
        let gray = to_gray(frame)?;
        let grid = grid.max(1);
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        let global = laplacian_variance(&gray)?;
        let mut cells = Vec::with_capacity(grid * grid);
        for row in 0..grid {
            for col in 0..grid {
                let (x0, y0) = (col * w / grid, row * h / grid);
                let (x1, y1) = ((col + 1) * w / grid, (row + 1) * h / grid);
                if x1 <= x0 || y1 <= y0 {
                    cells.push(0.0);
                    continue;
                }
                let rect = Rect::new(x0 as i32, y0 as i32, (x1 - x0) as i32, (y1 - y0) as i32);
                let roi = Mat::roi(&gray, rect)
                    .map_err(cv("sharpness roi"))?
                    .try_clone()
                    .map_err(cv("sharpness roi clone"))?;
                cells.push(laplacian_variance(&roi)?);
            }
        }
        Ok(SharpnessMap {
            global,
            grid,
            cells,
        })
    }

    fn edges_and_contours(&self, frame: &Frame) -> MediaResult<EdgeAnalysis> {
        let gray = to_gray(frame)?;

        let mut edges = Mat::default();
        imgproc::canny_def(&gray, &mut edges, 50.0, 150.0).map_err(cv("canny"))?;

        let mut found = Vector::<Vector<Point>>::new();
        imgproc::find_contours_def(
            &edges,
            &mut found,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
        )
        .map_err(cv("find contours"))?;
        let mut contours = Vec::with_capacity(found.len());
        for c in found.iter() {
            let area = imgproc::contour_area_def(&c).map_err(cv("contour area"))?;
            let r = imgproc::bounding_rect(&c).map_err(cv("bounding rect"))?;
            contours.push(Contour {
                bbox: BoundingBox::new(r.x as f64, r.y as f64, r.width as f64, r.height as f64),
                area,
            });
        }

        let mut sobel = Mat::default();
        imgproc::sobel(&gray, &mut sobel, core::CV_64F, 0, 1, 5, 1.0, 0.0, core::BORDER_DEFAULT)
            .map_err(cv("sobel"))?;
        let w = frame.width() as usize;
        let row_gradient = sobel
            .data_typed::<f64>()
            .map_err(cv("sobel data"))?
            .chunks(w.max(1))
            .map(|row| row.iter().map(|v| v.abs()).sum())
            .collect();

        let edge_bytes = edges.data_bytes().map_err(cv("edge data"))?.to_vec();
        let edges = image::GrayImage::from_raw(frame.width(), frame.height(), edge_bytes)
            .ok_or_else(|| MediaError::InvalidFrame("edge map size mismatch".to_string()))?;

        Ok(EdgeAnalysis {
            edges,
            contours,
            row_gradient,
        })
    }
}

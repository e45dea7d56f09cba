//! AVIF reading: container parse with `avif-parse`, AV1 decode with `rav1d`.
//!
//! The `image` crate's `"avif"` feature only provides the encoder (rav1e);
//! its decoder needs the C library dav1d. `rav1d` is the pure Rust port, used
//! here through its C-shaped API. Every decoder resource is released by an
//! [`OnDrop`] guard so early returns cannot leak the context or picture.

use super::backend::{BackendError, Dimensions};
use image::{DynamicImage, RgbImage};
use std::io::Cursor;
use std::ptr::NonNull;

/// Runs a closure when dropped.
struct OnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        (self.0)()
    }
}

fn parse(bytes: &[u8]) -> Result<avif_parse::AvifData, BackendError> {
    avif_parse::read_avif(&mut Cursor::new(bytes))
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to parse AVIF: {e:?}")))
}

/// Dimensions from the container metadata; no AV1 decode.
pub fn identify(bytes: &[u8]) -> Result<Dimensions, BackendError> {
    let avif = parse(bytes)?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to read AVIF metadata: {e:?}"))
    })?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Decode the primary item to an 8-bit RGB raster.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use rav1d::src::lib as dav1d;

    let avif = parse(bytes)?;
    let av1: &[u8] = &avif.primary_item;
    if av1.is_empty() {
        return Err(BackendError::ProcessingFailed(
            "AVIF has an empty primary item".into(),
        ));
    }

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    unsafe { dav1d::dav1d_default_settings(NonNull::new_unchecked(settings.as_mut_ptr())) };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc = unsafe { dav1d::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d open failed ({})",
            rc.0
        )));
    }
    let ctx_ptr: *mut _ = &mut ctx;
    let _ctx_guard = OnDrop(move || unsafe {
        dav1d::dav1d_close(NonNull::new(ctx_ptr));
    });

    let mut data = Dav1dData::default();
    let buf = unsafe { dav1d::dav1d_data_create(NonNull::new(&mut data), av1.len()) };
    if buf.is_null() {
        return Err(BackendError::ProcessingFailed(
            "rav1d data_create failed".into(),
        ));
    }
    unsafe { std::ptr::copy_nonoverlapping(av1.as_ptr(), buf, av1.len()) };

    let rc = unsafe { dav1d::dav1d_send_data(ctx, NonNull::new(&mut data)) };
    if rc.0 != 0 {
        unsafe { dav1d::dav1d_data_unref(NonNull::new(&mut data)) };
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d send_data failed ({})",
            rc.0
        )));
    }

    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { dav1d::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
    if rc.0 != 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d get_picture failed ({})",
            rc.0
        )));
    }
    let pic_ptr: *mut Dav1dPicture = &mut pic;
    let _pic_guard = OnDrop(move || unsafe {
        dav1d::dav1d_picture_unref(NonNull::new(pic_ptr));
    });

    let plane = |i: usize| {
        pic.data[i]
            .map(|p| p.as_ptr() as *const u8)
            .ok_or_else(|| BackendError::ProcessingFailed(format!("AVIF plane {i} missing")))
    };

    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let layout = pic.p.layout;
    let y = plane(0)?;

    let planes = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        YuvPlanes {
            y,
            u: y,
            v: y,
            y_stride: pic.stride[0],
            uv_stride: 0,
            width,
            height,
            bpc: pic.p.bpc as u32,
            subsampling: (false, false),
            monochrome: true,
        }
    } else {
        let subsampling = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => (true, true),
            DAV1D_PIXEL_LAYOUT_I422 => (true, false),
            DAV1D_PIXEL_LAYOUT_I444 => (false, false),
            other => {
                return Err(BackendError::Unsupported(format!(
                    "AVIF pixel layout {other}"
                )));
            }
        };
        YuvPlanes {
            y,
            u: plane(1)?,
            v: plane(2)?,
            y_stride: pic.stride[0],
            uv_stride: pic.stride[1],
            width,
            height,
            bpc: pic.p.bpc as u32,
            subsampling,
            monochrome: false,
        }
    };

    let rgb = planes.to_rgb();
    RgbImage::from_raw(width, height, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| BackendError::ProcessingFailed("Decoded AVIF has a bad raster size".into()))
}

/// Borrowed YUV planes of a decoded picture. Valid while the picture is.
struct YuvPlanes {
    y: *const u8,
    u: *const u8,
    v: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma halved (horizontally, vertically).
    subsampling: (bool, bool),
    monochrome: bool,
}

impl YuvPlanes {
    /// BT.601 YCbCr to interleaved RGB8.
    fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;
        let (ss_x, ss_y) = self.subsampling;

        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for row in 0..self.height {
            for col in 0..self.width {
                let luma = sample(self.y, self.y_stride, col, row, self.bpc);
                let [r, g, b] = if self.monochrome {
                    let v = (luma * scale).clamp(0.0, 255.0);
                    [v, v, v]
                } else {
                    let cx = if ss_x { col / 2 } else { col };
                    let cy = if ss_y { row / 2 } else { row };
                    let cb = sample(self.u, self.uv_stride, cx, cy, self.bpc) - center;
                    let cr = sample(self.v, self.uv_stride, cx, cy, self.bpc) - center;
                    [
                        ((luma + 1.402 * cr) * scale).clamp(0.0, 255.0),
                        ((luma - 0.344136 * cb - 0.714136 * cr) * scale).clamp(0.0, 255.0),
                        ((luma + 1.772 * cb) * scale).clamp(0.0, 255.0),
                    ]
                };
                rgb.extend_from_slice(&[r as u8, g as u8, b as u8]);
            }
        }
        rgb
    }
}

#[inline]
fn sample(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        // high bit depth is stored as u16
        let offset = y as isize * stride + x as isize * 2;
        (unsafe { (ptr.offset(offset) as *const u16).read_unaligned() }) as f32
    }
}

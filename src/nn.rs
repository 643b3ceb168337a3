//! Neural Network inference.

use std::{ops::RangeInclusive, path::Path, sync::Arc};

use tract_onnx::prelude::{
    tract_ndarray::Array4, tvec, Framework, Graph, InferenceModelExt, SimplePlan, TValue, TVec,
    Tensor, TypedFact, TypedOp,
};

use crate::image::{Color, Image, Rect, Resolution};

type Model = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A convolutional neural network (CNN) that operates on image data.
///
/// The network must take a single NCHW (`[1, 3, H, W]`) RGB input tensor.
pub struct Cnn {
    model: Model,
    input_res: Resolution,
    color_mapper: ColorMapper,
}

impl Cnn {
    /// Loads a pre-trained model from an ONNX file path and optimizes it.
    ///
    /// The path must have a `.onnx` extension.
    pub fn load<P: AsRef<Path>>(path: P, color_mapper: ColorMapper) -> anyhow::Result<Self> {
        Self::load_impl(path.as_ref(), color_mapper)
    }

    fn load_impl(path: &Path, color_mapper: ColorMapper) -> anyhow::Result<Self> {
        match path.extension() {
            Some(ext) if ext == "onnx" => {}
            _ => anyhow::bail!(
                "neural network file '{}' must have `.onnx` extension",
                path.display()
            ),
        }

        let graph = tract_onnx::onnx().model_for_path(path)?.into_optimized()?;
        let model = SimplePlan::new(graph)?;
        let input_res = Self::get_input_res(&model)?;

        log::debug!(
            "loaded network '{}' with input resolution {}",
            path.display(),
            input_res
        );

        Ok(Self {
            model,
            input_res,
            color_mapper,
        })
    }

    fn get_input_res(model: &Model) -> anyhow::Result<Resolution> {
        let graph = model.model();
        if graph.inputs.len() != 1 {
            anyhow::bail!(
                "CNN network has to take exactly 1 input, this one takes {}",
                graph.inputs.len(),
            );
        }

        let fact = graph.input_fact(0)?;
        let (w, h) = match fact.shape.as_concrete() {
            Some(&[1, 3, h, w]) => (w, h),
            shape => anyhow::bail!("invalid model input shape for NCHW CNN: {:?}", shape),
        };

        let (w, h): (u32, u32) = (w.try_into()?, h.try_into()?);
        Ok(Resolution::new(w, h))
    }

    /// Returns the expected input image size.
    #[inline]
    pub fn input_resolution(&self) -> Resolution {
        self.input_res
    }

    /// Runs the network on the `roi` section of `image`, returning the estimated outputs.
    ///
    /// The region is sampled (nearest neighbor) to the network's input resolution. If its aspect
    /// ratio does not match the network's, the region will be stretched. Parts of `roi` outside of
    /// `image` are read as black.
    pub fn estimate(&self, image: &Image, roi: Rect) -> anyhow::Result<Outputs> {
        let tensor = self.sample(image, roi);
        let outputs = self
            .model
            .run(tvec![TValue::from_const(Arc::new(tensor))])?;
        Ok(Outputs { inner: outputs })
    }

    fn sample(&self, image: &Image, roi: Rect) -> Tensor {
        let (w, h) = (
            self.input_res.width() as usize,
            self.input_res.height() as usize,
        );
        let bounds = image.rect();
        let mapper = &self.color_mapper;

        let array = Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
            let sx = roi.x() + ((x as f32 + 0.5) / w as f32 * roi.width() as f32) as i32;
            let sy = roi.y() + ((y as f32 + 0.5) / h as f32 * roi.height() as f32) as i32;
            let color = if bounds.contains(sx, sy) {
                image.get(sx as u32, sy as u32)
            } else {
                Color::BLACK
            };
            mapper.map(color)[c]
        });
        Tensor::from(array)
    }
}

/// Maps 8-bit sRGB colors to the value range a network expects.
#[derive(Debug, Clone)]
pub struct ColorMapper {
    target_range: RangeInclusive<f32>,
}

impl ColorMapper {
    /// Creates a simple color mapper that uniformly maps sRGB values to `target_range`.
    ///
    /// Note that this operates on *non-linear* sRGB colors, but maps them linearly to the target
    /// range.
    pub fn linear(target_range: RangeInclusive<f32>) -> Self {
        assert!(target_range.end() > target_range.start());
        Self { target_range }
    }

    fn map(&self, color: Color) -> [f32; 3] {
        let start = *self.target_range.start();
        let end = *self.target_range.end();

        let adjust_range = (end - start) / 255.0;
        [color.r(), color.g(), color.b()].map(|col| col as f32 * adjust_range + start)
    }
}

/// The result of a neural network inference pass.
///
/// This is a list of tensors corresponding to the network's output nodes.
#[derive(Debug)]
pub struct Outputs {
    inner: TVec<TValue>,
}

impl Outputs {
    /// Returns the number of tensors in this inference output.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the shape and the flattened `f32` data of output tensor `index`.
    ///
    /// Returns an error if there is no such output or if it does not hold `f32` values.
    pub fn get(&self, index: usize) -> anyhow::Result<(&[usize], &[f32])> {
        let tensor = self.inner.get(index).ok_or_else(|| {
            anyhow::anyhow!(
                "network output {} requested, but it only has {}",
                index,
                self.len()
            )
        })?;
        Ok((tensor.shape(), tensor.as_slice::<f32>()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_mapper() {
        let mapper = ColorMapper::linear(0.0..=1.0);
        assert_eq!(mapper.map(Color::BLACK), [0.0, 0.0, 0.0]);
        assert_eq!(mapper.map(Color::WHITE), [1.0, 1.0, 1.0]);

        let mapper = ColorMapper::linear(-1.0..=1.0);
        assert_eq!(mapper.map(Color::BLACK), [-1.0, -1.0, -1.0]);
        assert_eq!(mapper.map(Color::WHITE), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn rejects_non_onnx_path() {
        let err = Cnn::load("model.tflite", ColorMapper::linear(0.0..=1.0))
            .err()
            .unwrap();
        assert!(err.to_string().contains("`.onnx` extension"), "{err}");
    }
}

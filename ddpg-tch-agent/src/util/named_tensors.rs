use anyhow::{Context, Result};
use ddpg_core::error::DdpgError;
use log::trace;
use std::{collections::HashMap, iter::FromIterator, path::Path};
use tch::{nn::VarStore, Device::Cpu, Tensor};

/// Host-memory copy of the parameters of a [`VarStore`].
///
/// Checkpoints are written from this copy, so tensors living on an
/// accelerator are never serialized directly.
pub struct NamedTensors {
    pub named_tensors: HashMap<String, Tensor>,
}

impl NamedTensors {
    /// Copy data of VarStore to CPU.
    pub fn copy_from(vs: &VarStore) -> Self {
        let src = vs.variables();

        tch::no_grad(|| NamedTensors {
            named_tensors: HashMap::from_iter(src.iter().map(|(k, v)| {
                let v = v.detach().to(Cpu).copy();
                (k.clone(), v)
            })),
        })
    }

    /// Checks that every variable of the [`VarStore`] is found in `self` with the same shape.
    pub fn check(&self, vs: &VarStore) -> Result<()> {
        for (name, dest) in vs.variables().iter() {
            let src = self
                .named_tensors
                .get(name)
                .ok_or_else(|| DdpgError::MissingParameter(name.clone()))?;
            if src.size() != dest.size() {
                return Err(DdpgError::ShapeMismatch {
                    name: name.clone(),
                    expected: dest.size(),
                    found: src.size(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Copy named tensors to [`VarStore`].
    ///
    /// Every variable of the [`VarStore`] must be found in `self`.
    pub fn copy_to(&self, vs: &mut VarStore) -> Result<()> {
        self.check(vs)?;
        let src = &self.named_tensors;
        let mut dest = vs.variables();

        tch::no_grad(|| -> Result<()> {
            for (name, dest) in dest.iter_mut() {
                let src = src
                    .get(name)
                    .ok_or_else(|| DdpgError::MissingParameter(name.clone()))?;
                dest.f_copy_(src)?;
            }
            Ok(())
        })
    }

    /// Writes the tensors into a file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let named = self.named_tensors.iter().collect::<Vec<_>>();
        Tensor::save_multi(&named, &path)
            .with_context(|| format!("Failed to save parameters to {:?}", path.as_ref()))?;
        for (name, _) in named.iter() {
            trace!("Save variable {}", name);
        }
        Ok(())
    }

    /// Reads tensors from a file into host memory.
    pub fn load<T: AsRef<Path>>(path: T) -> Result<Self> {
        let named = Tensor::load_multi_with_device(&path, Cpu)
            .with_context(|| format!("Failed to load parameters from {:?}", path.as_ref()))?;
        Ok(Self {
            named_tensors: HashMap::from_iter(named),
        })
    }
}

impl Clone for NamedTensors {
    fn clone(&self) -> Self {
        let src = &self.named_tensors;

        tch::no_grad(|| NamedTensors {
            named_tensors: HashMap::from_iter(src.iter().map(|(k, v)| {
                let v = v.detach().to(Cpu).copy();
                (k.clone(), v)
            })),
        })
    }
}

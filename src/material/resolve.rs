//! Cross-stage parameter resolution.
//!
//! A technique's programs are reflected independently, so the same name may
//! show up in several stages with different layouts. These functions decide
//! which names are safe to drive from a single material parameter.
//!
//! Inputs are the [`GpuParamDesc`]s of every program of every pass, in pass
//! order then stage order.

use rustc_hash::{FxHashMap, FxHashSet};

use super::param_desc::{GpuParamBlockDesc, GpuParamDataDesc, GpuParamDesc, are_params_equal};

/// Data parameters declared identically (offsets aside) everywhere they appear.
///
/// A name declared with conflicting layouts is dropped for good, even if a
/// later stage agrees with one of the earlier declarations.
#[must_use]
pub fn determine_valid_data_parameters<'a>(
    descs: &[&'a GpuParamDesc],
) -> FxHashMap<&'a str, &'a GpuParamDataDesc> {
    let mut valid: FxHashMap<&str, &GpuParamDataDesc> = FxHashMap::default();
    let mut invalid: FxHashSet<&str> = FxHashSet::default();

    for &desc in descs {
        for (name, param) in &desc.params {
            let name = name.as_str();
            if invalid.contains(name) {
                continue;
            }

            let Some(existing) = valid.get(name).copied() else {
                valid.insert(name, param);
                continue;
            };

            if !are_params_equal(param, existing, true) {
                log::warn!(
                    "Found two parameters with the same name but different contents: {name}"
                );
                valid.remove(name);
                invalid.insert(name);
            }
        }
    }

    valid
}

/// Every object parameter name. Object parameters carry no layout, so any
/// declaration is compatible with any other.
#[must_use]
pub fn determine_valid_object_parameters<'a>(descs: &[&'a GpuParamDesc]) -> FxHashSet<&'a str> {
    descs
        .iter()
        .flat_map(|&desc| desc.objects().map(|object| object.name.as_str()))
        .collect()
}

/// Shareable blocks whose layout agrees across every stage declaring them.
///
/// Two declarations agree when they have the same size and the same members
/// in the same order, each with an equal layout at the same offset inside the
/// block. One buffer backs all of them, so any padding difference disqualifies
/// the block.
#[must_use]
pub fn determine_valid_shareable_param_blocks<'a>(
    descs: &[&'a GpuParamDesc],
) -> FxHashSet<&'a str> {
    let mut first_seen: FxHashMap<&str, (&GpuParamDesc, &GpuParamBlockDesc)> =
        FxHashMap::default();
    let mut valid: FxHashMap<&str, bool> = FxHashMap::default();

    for &desc in descs {
        for (name, block) in &desc.param_blocks {
            if !block.is_shareable {
                continue;
            }
            let name = name.as_str();

            let Some(&(other_desc, other_block)) = first_seen.get(name) else {
                first_seen.insert(name, (desc, block));
                valid.insert(name, true);
                continue;
            };

            if valid[name] && !blocks_match(desc, block, other_desc, other_block) {
                log::warn!(
                    "Found two param blocks with the same name but different contents: {name}"
                );
                valid.insert(name, false);
            }
        }
    }

    valid
        .into_iter()
        .filter_map(|(name, ok)| ok.then_some(name))
        .collect()
}

/// GPU variable name → name of the block it lives in.
#[must_use]
pub fn determine_parameter_to_block_mapping<'a>(
    descs: &[&'a GpuParamDesc],
) -> FxHashMap<&'a str, &'a str> {
    let mut mapping = FxHashMap::default();
    for &desc in descs {
        for (name, param) in &desc.params {
            mapping
                .entry(name.as_str())
                .or_insert(param.param_block.as_str());
        }
    }
    mapping
}

fn blocks_match(
    desc_a: &GpuParamDesc,
    block_a: &GpuParamBlockDesc,
    desc_b: &GpuParamDesc,
    block_b: &GpuParamBlockDesc,
) -> bool {
    if block_a.block_size != block_b.block_size {
        return false;
    }

    let members_a = desc_a.block_members(&block_a.name);
    let members_b = desc_b.block_members(&block_b.name);

    members_a.len() == members_b.len()
        && members_a.iter().zip(&members_b).all(|(a, b)| {
            a.name == b.name
                && are_params_equal(a, b, true)
                && a.gpu_mem_offset == b.gpu_mem_offset
        })
}

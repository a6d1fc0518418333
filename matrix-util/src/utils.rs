/// partition membership vector into groups of indexes
/// # Arguments
/// * `membership` - a vector of membership (E.g., cluster assignment)
/// * `ngroups` - number of groups; membership values must be below it
/// # Returns
/// `ngroups` vectors: group `k` -> indexes of the elements in increasing order
pub fn partition_by_membership(
    membership: &[usize],
    ngroups: usize,
) -> anyhow::Result<Vec<Vec<usize>>> {
    let mut groups = vec![vec![]; ngroups];
    for (elem, &k) in membership.iter().enumerate() {
        if k >= ngroups {
            anyhow::bail!("membership {} of element {} >= {}", k, elem, ngroups);
        }
        groups[k].push(elem);
    }
    Ok(groups)
}

/// Count elements per group
pub fn membership_sizes(membership: &[usize], ngroups: usize) -> Vec<usize> {
    let mut counts = vec![0; ngroups];
    for &k in membership {
        if k < ngroups {
            counts[k] += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_keeps_order() -> anyhow::Result<()> {
        let groups = partition_by_membership(&[1, 0, 1, 2, 1], 4)?;
        assert_eq!(groups, vec![vec![1], vec![0, 2, 4], vec![3], vec![]]);
        assert_eq!(membership_sizes(&[1, 0, 1, 2, 1], 4), vec![1, 3, 1, 0]);
        Ok(())
    }

    #[test]
    fn out_of_range_membership() {
        assert!(partition_by_membership(&[0, 3], 3).is_err());
    }
}

//! Exact test of Hardy-Weinberg proportions (Wigginton, Cutler & Abecasis 2005).

/// Two-sided exact HWE p-value for a biallelic locus.
///
/// The probability of every heterozygote count compatible with the observed
/// allele counts is obtained by recurrence outward from the most likely
/// count; the p-value sums the probabilities not exceeding the observed one.
pub fn hwe_exact_pvalue(obs_hets: usize, obs_hom1: usize, obs_hom2: usize) -> f64 {
    let obs_homc = obs_hom1.max(obs_hom2);
    let obs_homr = obs_hom1.min(obs_hom2);
    let rare_copies = 2 * obs_homr + obs_hets;
    let genotypes = obs_hets + obs_homc + obs_homr;

    if genotypes == 0 {
        return 1.0;
    }

    let mut het_probs = vec![0.0_f64; rare_copies + 1];

    // start at the mode of the distribution, parity matched to rare_copies
    let mut mid = rare_copies * (2 * genotypes - rare_copies) / (2 * genotypes);
    if (rare_copies & 1) != (mid & 1) {
        mid += 1;
    }

    het_probs[mid] = 1.0;
    let mut sum = 1.0;

    let mut curr_hets = mid;
    let mut curr_homr = (rare_copies - mid) / 2;
    let mut curr_homc = genotypes - curr_hets - curr_homr;
    while curr_hets >= 2 {
        let next = het_probs[curr_hets] * (curr_hets * (curr_hets - 1)) as f64
            / (4.0 * (curr_homr + 1) as f64 * (curr_homc + 1) as f64);
        het_probs[curr_hets - 2] = next;
        sum += next;
        curr_hets -= 2;
        curr_homr += 1;
        curr_homc += 1;
    }

    curr_hets = mid;
    curr_homr = (rare_copies - mid) / 2;
    curr_homc = genotypes - curr_hets - curr_homr;
    while curr_hets + 2 <= rare_copies {
        let next = het_probs[curr_hets] * 4.0 * curr_homr as f64 * curr_homc as f64
            / ((curr_hets + 2) * (curr_hets + 1)) as f64;
        het_probs[curr_hets + 2] = next;
        sum += next;
        curr_hets += 2;
        curr_homr -= 1;
        curr_homc -= 1;
    }

    let observed = het_probs[obs_hets] / sum;
    let p: f64 = het_probs
        .iter()
        .map(|&prob| prob / sum)
        .filter(|&prob| prob <= observed * (1.0 + 1e-12))
        .sum();

    p.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monomorphic_locus_is_in_equilibrium() {
        assert!((hwe_exact_pvalue(0, 40, 0) - 1.0).abs() < 1e-12);
        assert!((hwe_exact_pvalue(0, 0, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn equilibrium_proportions_have_high_pvalue() {
        assert!(hwe_exact_pvalue(50, 25, 25) > 0.5);
        assert!(hwe_exact_pvalue(32, 64, 4) > 0.5);
    }

    #[test]
    fn heterozygote_deficit_is_significant() {
        assert!(hwe_exact_pvalue(0, 50, 50) < 1e-10);
    }

    #[test]
    fn heterozygote_excess_is_significant() {
        assert!(hwe_exact_pvalue(100, 0, 0) < 1e-10);
    }

    #[test]
    fn symmetric_in_homozygote_classes() {
        let a = hwe_exact_pvalue(12, 30, 8);
        let b = hwe_exact_pvalue(12, 8, 30);
        assert!((a - b).abs() < 1e-15);
    }

    #[test]
    fn small_sample_exact_value() {
        // n = 2, one copy of each allele in each individual: P(2 hets) = 2/3,
        // P(0 hets) = 1/3, so observing two hets has p = 1
        assert!((hwe_exact_pvalue(2, 0, 0) - 1.0).abs() < 1e-12);
        assert!((hwe_exact_pvalue(0, 1, 1) - 1.0 / 3.0).abs() < 1e-12);
    }
}

use std::fs;

use approx::assert_abs_diff_eq;
use indexmap::IndexMap;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use ecoplace::common::Allocation;
use ecoplace::config::AllocatorConfig;
use ecoplace::diagnostics::{CsvDiagnostics, NoDiagnostics};
use ecoplace::error::Error;
use ecoplace::experiment::Experiment;
use ecoplace::genetic::{genetic_algorithm, GeneticAlgorithm};
use ecoplace::population::{assign_vm_ids, generate_initial_population};
use ecoplace::request::PredictRequest;
use ecoplace::resource::{load_resources, Resource, ResourceStatus};
use ecoplace::solution::{PlacementProblem, Solution};
use ecoplace::vm::VmRequest;

fn name_wrapper(file_name: &str) -> String {
    format!("test-configs/{}", file_name)
}

fn two_resources() -> Vec<Resource> {
    vec![
        Resource::new("a", 4, 8., 100., 100., 50.),
        Resource::new("b", 2, 4., 50., 50., 30.),
    ]
}

fn problem(vms: Vec<VmRequest>, resources: Vec<Resource>) -> PlacementProblem {
    let mut vms = vms;
    assign_vm_ids(&mut vms, &mut Pcg64::seed_from_u64(1));
    PlacementProblem::new(vms, resources)
}

fn request(population_size: usize, generations: usize, vms: Vec<VmRequest>) -> PredictRequest {
    PredictRequest {
        population_size,
        generations,
        chance_mutation: 50,
        vms,
    }
}

fn small_vms(count: usize) -> Vec<VmRequest> {
    (0..count).map(|_| VmRequest::new(1, 2., 10., 10.)).collect()
}

#[test]
// Single VM fits both resources, so it lands on one of them and fitness equals that resource power.
fn test_single_vm_population() {
    let problem = problem(vec![VmRequest::new(2, 4., 10., 10.)], two_resources());
    let mut rng = Pcg64::seed_from_u64(123);
    let mut population = generate_initial_population(&problem, 20, &mut rng).unwrap();

    assert_eq!(population.len(), 20);
    let mut seen = [false; 2];
    for solution in population.iter_mut() {
        assert!(solution.is_valid(&problem));
        assert!(solution.is_complete(&problem));
        let alloc = solution.allocation.values().next().unwrap();
        seen[alloc.resource] = true;
        let expected = if alloc.resource == 0 { 50. } else { 30. };
        assert_eq!(solution.evaluate(&problem), expected);
    }
    assert!(seen[0] && seen[1]);
}

#[test]
fn test_infeasible_request() {
    let problem = problem(vec![VmRequest::new(8, 1., 1., 1.)], two_resources());
    let mut rng = Pcg64::seed_from_u64(123);
    let result = generate_initial_population(&problem, 5, &mut rng);
    assert!(matches!(result, Err(Error::InfeasibleRequest(_))));

    let result = genetic_algorithm(
        &request(5, 3, vec![VmRequest::new(8, 1., 1., 1.)]),
        &two_resources(),
        AllocatorConfig::default(),
    );
    assert!(matches!(result, Err(Error::InfeasibleRequest(_))));
}

#[test]
// Placing the small VM on "a" leaves no room for the large one, so about half of candidates are discarded.
// Depending on the seed the initializer either returns a short population or gives up.
fn test_partially_feasible_request() {
    let vms = vec![VmRequest::new(1, 1., 1., 1.), VmRequest::new(3, 1., 1., 1.)];
    let resources = vec![
        Resource::new("a", 3, 8., 100., 100., 50.),
        Resource::new("b", 1, 8., 100., 100., 30.),
    ];
    let problem = problem(vms, resources);

    let mut short_populations = 0;
    let mut late_failures = 0;
    let mut early_failures = 0;
    for seed in 0..200 {
        let mut rng = Pcg64::seed_from_u64(seed);
        match generate_initial_population(&problem, 10, &mut rng) {
            Ok(population) => {
                assert!(!population.is_empty());
                if population.len() < 10 {
                    short_populations += 1;
                }
                for solution in &population {
                    assert!(solution.is_valid(&problem));
                    assert!(solution.is_complete(&problem));
                    assert_eq!(solution.allocation[0].resource, 1);
                    assert_eq!(solution.allocation[1].resource, 0);
                }
            }
            Err(Error::InfeasibleRequest(msg)) => {
                if msg.contains("(0 of 10") {
                    early_failures += 1;
                } else {
                    late_failures += 1;
                }
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert!(short_populations > 0);
    assert!(early_failures > 0);
    assert!(late_failures > 0);
}

#[test]
// Inactive resource is never selected even though it is the largest and the cheapest one.
fn test_inactive_resource_is_skipped() {
    let resources = vec![
        Resource::new("big", 16, 64., 1000., 1000., 10.).with_status(ResourceStatus::Inactive),
        Resource::new("a", 4, 8., 100., 100., 50.),
        Resource::new("b", 2, 4., 50., 50., 30.),
    ];
    let problem = problem(small_vms(2), resources);
    let mut rng = Pcg64::seed_from_u64(7);
    let population = generate_initial_population(&problem, 30, &mut rng).unwrap();
    for solution in &population {
        assert!(solution.allocation.values().all(|alloc| alloc.resource != 0));
    }

    let only_inactive = vec![Resource::new("big", 16, 64., 1000., 1000., 10.).with_status(ResourceStatus::Inactive)];
    let problem = PlacementProblem::new(problem.vms.clone(), only_inactive);
    let result = generate_initial_population(&problem, 3, &mut rng);
    assert!(matches!(result, Err(Error::InfeasibleRequest(_))));
}

#[test]
// Placed VMs reduce available CPU for the following VMs of the same candidate.
fn test_initial_population_respects_capacity() {
    let problem = problem(small_vms(5), two_resources());
    let mut rng = Pcg64::seed_from_u64(5);
    let population = generate_initial_population(&problem, 50, &mut rng).unwrap();
    for solution in &population {
        let pool = solution.replay(&problem);
        assert!(pool.get_available_cpu(0) >= 0);
        assert!(pool.get_available_cpu(1) >= 0);
        assert!(pool.get_available_memory(1) >= 0.);
        assert!(solution.is_valid(&problem));
    }
}

#[test]
// Bandwidth is not consumed: three VMs requiring 60 each fit one resource with bandwidth 100.
fn test_bandwidth_checked_against_nominal_capacity() {
    let vms = (0..3).map(|_| VmRequest::new(1, 1., 1., 60.)).collect();
    let shared = problem(vms, vec![Resource::new("a", 4, 8., 100., 100., 50.)]);
    let mut rng = Pcg64::seed_from_u64(3);
    let population = generate_initial_population(&shared, 4, &mut rng).unwrap();
    assert_eq!(population.len(), 4);
    assert!(population.iter().all(|s| s.is_valid(&shared)));

    let wide = problem(vec![VmRequest::new(1, 1., 1., 101.)], vec![Resource::new("a", 4, 8., 100., 100., 50.)]);
    assert!(generate_initial_population(&wide, 4, &mut rng).is_err());
}

#[test]
// Resource hosting several VMs is counted once.
fn test_energy_of_distinct_resources() {
    let problem = problem(small_vms(3), two_resources());
    let mut allocation = IndexMap::new();
    allocation.insert(problem.vms[0].id().to_string(), Allocation::new(0, 0));
    allocation.insert(problem.vms[1].id().to_string(), Allocation::new(1, 0));
    allocation.insert(problem.vms[2].id().to_string(), Allocation::new(2, 1));
    let mut solution = Solution::new(allocation);

    assert_eq!(solution.fitness, 0.);
    assert_eq!(solution.evaluate(&problem), 80.);
    assert!(solution.is_valid(&problem));

    solution.allocation[2].resource = 0;
    assert_eq!(solution.evaluate(&problem), 50.);
}

#[test]
fn test_overcommitted_solution_is_invalid() {
    let problem = problem(small_vms(3), two_resources());
    let allocation = problem
        .vms
        .iter()
        .enumerate()
        .map(|(i, vm)| (vm.id().to_string(), Allocation::new(i, 1)))
        .collect::<IndexMap<_, _>>();
    let solution = Solution::new(allocation);
    assert!(solution.is_complete(&problem));
    assert!(!solution.is_valid(&problem));
    assert_eq!(solution.replay(&problem).get_available_cpu(1), -1);
}

#[test]
// One generation of a population of 3 keeps every VM allocated and can't be worse than the initial population.
fn test_one_generation() {
    let vms = (1..=3)
        .map(|i| VmRequest::new(1, 2., 10., 10.).with_id(&format!("vm-{}", i)))
        .collect::<Vec<_>>();
    let req = request(3, 1, vms.clone());
    let config = AllocatorConfig::default().with_seed(17);

    // VMs have identifiers, so the run draws its initial population first from the same seed.
    let initial_problem = PlacementProblem::new(vms, two_resources());
    let mut rng = Pcg64::seed_from_u64(17);
    let mut initial = generate_initial_population(&initial_problem, 3, &mut rng).unwrap();
    let initial_worst = initial
        .iter_mut()
        .map(|solution| solution.evaluate(&initial_problem))
        .fold(f64::NEG_INFINITY, f64::max);

    let mut ga = GeneticAlgorithm::new(config);
    let result = ga.run(&req, &two_resources(), &mut NoDiagnostics::new()).unwrap();

    assert_eq!(result.best.allocation.len(), 3);
    assert!(result.best.is_complete(&result.problem));
    assert!(result.best.is_valid(&result.problem));
    assert_eq!(result.stats.generation_count(), 1);
    assert!(result.best.fitness <= initial_worst);
    assert_eq!(result.stats.snapshots.len(), 1);
    assert_eq!(result.stats.snapshots[0].generation, 0);
}

#[test]
// Parents survive unchanged, so the best fitness never increases over generations.
fn test_best_fitness_is_monotone() {
    let mut req = request(12, 15, small_vms(4));
    req.chance_mutation = 80;
    let result = genetic_algorithm(&req, &two_resources(), AllocatorConfig::default().with_seed(99)).unwrap();

    let best = &result.stats.best_fitness;
    assert_eq!(best.len(), 15);
    for w in best.windows(2) {
        assert!(w[1] <= w[0]);
    }
    for g in result.stats.generations() {
        assert!(g.best <= g.mean && g.mean <= g.worst);
    }
    assert_eq!(result.best.fitness, *best.last().unwrap());

    // Snapshots are taken at generation 0 and whenever the best fitness changes.
    let snapshots = &result.stats.snapshots;
    assert_eq!(snapshots[0].generation, 0);
    for w in snapshots.windows(2) {
        assert!(w[1].energy_consumption < w[0].energy_consumption);
    }
}

#[test]
fn test_response() {
    let vms = vec![
        VmRequest::new(1, 1., 1., 1.).with_id("vm-1"),
        VmRequest::new(1, 1., 1., 1.).with_id("vm-2"),
    ];
    let resources = vec![Resource::new("only", 4, 8., 100., 100., 42.)];
    let result = genetic_algorithm(&request(4, 2, vms), &resources, AllocatorConfig::default()).unwrap();
    let response = result.to_response();

    assert_eq!(response.energy_consumption, 42.);
    assert_eq!(response.allocation.len(), 2);
    assert_eq!(response.allocation[0].vm, "vm-1");
    assert_eq!(response.allocation[1].vm, "vm-2");
    assert!(response.allocation.iter().all(|p| p.resource == "only"));

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["allocation"][0]["resource"], "only");
    assert_eq!(json["energy_consumption"], 42.);
}

#[test]
fn test_missing_ids_are_assigned() {
    let result = genetic_algorithm(&request(3, 1, small_vms(2)), &two_resources(), AllocatorConfig::default()).unwrap();
    let ids = result.problem.vms.iter().map(|vm| vm.id().to_string()).collect::<Vec<_>>();
    assert!(ids.iter().all(|id| id.len() == 16));
    assert_ne!(ids[0], ids[1]);
    assert_eq!(result.best.allocation.keys().cloned().collect::<Vec<_>>(), ids);
}

#[test]
fn test_same_seed_same_result() {
    let req = request(9, 6, small_vms(4));
    let first = genetic_algorithm(&req, &two_resources(), AllocatorConfig::default()).unwrap();
    let second = genetic_algorithm(&req, &two_resources(), AllocatorConfig::default()).unwrap();
    assert_eq!(first.to_response(), second.to_response());
    assert_eq!(first.stats.mean_fitness, second.stats.mean_fitness);
}

#[test]
fn test_utilization_snapshot() {
    let problem = problem(small_vms(2), two_resources());
    let mut allocation = IndexMap::new();
    allocation.insert(problem.vms[0].id().to_string(), Allocation::new(0, 0));
    allocation.insert(problem.vms[1].id().to_string(), Allocation::new(1, 0));
    let solution = Solution::new(allocation);

    let result = genetic_algorithm(&request(3, 1, small_vms(2)), &two_resources(), AllocatorConfig::default()).unwrap();
    assert_eq!(result.stats.snapshots[0].resources.len(), 2);

    let snapshot = ecoplace::run_stats::UtilizationSnapshot::new(3, &solution, &problem);
    assert_eq!(snapshot.generation, 3);
    assert_eq!(snapshot.energy_consumption, 50.);
    let a = &snapshot.resources[0];
    assert_abs_diff_eq!(a.cpu_usage, 50.);
    assert_abs_diff_eq!(a.memory_usage, 50.);
    assert_abs_diff_eq!(a.storage_usage, 20.);
    assert_abs_diff_eq!(a.usage, 40.);
    assert_eq!(snapshot.resources[1].usage, 0.);
}

#[test]
fn test_csv_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("resource_utilization_gen_99.csv");
    fs::write(&stale, "stale").unwrap();
    let other = dir.path().join("notes.txt");
    fs::write(&other, "kept").unwrap();

    let dir_name = dir.path().display().to_string();
    let mut sink = CsvDiagnostics::new(&dir_name);
    let mut ga = GeneticAlgorithm::new(AllocatorConfig::default());
    let result = ga.run(&request(6, 4, small_vms(3)), &two_resources(), &mut sink).unwrap();

    assert!(!stale.exists());
    assert!(other.exists());
    for snapshot in &result.stats.snapshots {
        assert!(sink.utilization_path(snapshot.generation).exists());
    }
    let stats = fs::read_to_string(sink.fitness_stats_path()).unwrap();
    let lines = stats.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "generation,best,mean,worst");
    assert_eq!(lines.len(), 5);

    let utilization = fs::read_to_string(sink.utilization_path(0)).unwrap();
    assert!(utilization.starts_with("resource,energy_consumption,cpu_usage,memory_usage,storage_usage,usage"));
    assert_eq!(utilization.lines().count(), 3);
}

#[test]
fn test_diagnostics_dir_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AllocatorConfig::default();
    config.diagnostics_dir = Some(dir.path().join("plot").display().to_string());
    genetic_algorithm(&request(3, 2, small_vms(2)), &two_resources(), config).unwrap();
    assert!(dir.path().join("plot").join("fitness_stats.csv").exists());
    assert!(dir.path().join("plot").join("resource_utilization_gen_0.csv").exists());
}

#[test]
fn test_load_inputs() {
    let resources = load_resources(&name_wrapper("resources.yaml")).unwrap();
    assert_eq!(resources.len(), 3);
    assert_eq!(resources[0].id, "a");
    assert_eq!(resources[0].cpu_cores, 4);
    assert_eq!(resources[0].memory, 8.);
    assert_eq!(resources[2].status, ResourceStatus::Inactive);

    let json = load_resources(&name_wrapper("resources.json")).unwrap();
    assert_eq!(json, resources[..1].to_vec());

    let req = PredictRequest::from_file(&name_wrapper("request.yaml")).unwrap();
    assert_eq!(req.population_size, 6);
    assert_eq!(req.vms.len(), 3);
    assert_eq!(req.vms[0].id.as_deref(), Some("vm-1"));
    assert_eq!(req.vms[2].id, None);
    assert!(req.validate().is_ok());

    let config = AllocatorConfig::from_file(&name_wrapper("config.yaml")).unwrap();
    assert_eq!(config.seed, 42);
    assert_eq!(config.crossover_attempts, 3);
    assert_eq!(config.mutation_attempts, 11);
    assert_eq!(config.diagnostics_dir, None);

    assert!(matches!(
        load_resources(&name_wrapper("missing.yaml")),
        Err(Error::Io { .. })
    ));

    let result = genetic_algorithm(&req, &resources, config).unwrap();
    assert!(result.best.is_valid(&result.problem));
    assert!(result.best.allocation.values().all(|alloc| alloc.resource != 2));
}

#[test]
fn test_experiment() {
    let exp = Experiment::new(request(6, 5, small_vms(4)), two_resources(), AllocatorConfig::default(), 3);
    let result = exp.run(2).unwrap();
    assert_eq!(result.runs.len(), 3);
    for w in result.runs.windows(2) {
        assert!(w[0].energy_consumption <= w[1].energy_consumption);
    }
    assert_eq!(result.best.energy_consumption, result.runs[0].energy_consumption);
    assert_eq!(result.best.allocation.len(), 4);
    let mut seeds = result.runs.iter().map(|r| r.seed).collect::<Vec<_>>();
    seeds.sort();
    assert_eq!(seeds, vec![123, 124, 125]);

    let infeasible = Experiment::new(
        request(6, 5, vec![VmRequest::new(64, 1., 1., 1.)]),
        two_resources(),
        AllocatorConfig::default(),
        2,
    );
    assert!(matches!(infeasible.run(2), Err(Error::InfeasibleRequest(_))));
}

//! Solidity ABI surface of the controller and deployed accounts.
//!
//! These keep ABI expectations explicit for callers and give off-chain code the selectors.

use alloy_sol_types::sol;

sol! {
    interface IExecutorAccessController {
        function addAdmin(address admin) external;
        function removeAdmin(address admin) external;
        function addExecutor(address executor) external;
        function removeExecutor(address executor) external;
        function isOwner(address account) external view returns (bool);
        function isAdmin(address account) external view returns (bool);
        function isExecutor(address account) external view returns (bool);
        function adderOf(address executor) external view returns (address);
    }

    /// Read accessors answered by the implementation on behalf of the proxy.
    interface IProxyGettable {
        function implementation() external view returns (address);
        function proxyOwner() external view returns (address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;
    use alloy_sol_types::SolCall;

    fn selector(sig: &str) -> [u8; 4] {
        let h = keccak256(sig.as_bytes());
        [h[0], h[1], h[2], h[3]]
    }

    #[test]
    fn selectors_match_signatures() {
        assert_eq!(
            IProxyGettable::implementationCall::SELECTOR,
            selector("implementation()")
        );
        assert_eq!(IProxyGettable::proxyOwnerCall::SELECTOR, selector("proxyOwner()"));
        assert_eq!(
            IExecutorAccessController::addExecutorCall::SELECTOR,
            selector("addExecutor(address)")
        );
    }
}
